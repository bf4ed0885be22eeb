//! Error types for the mentor library
//!
//! Storage, completion and input-validation failures are kept apart so that
//! callers (HTTP handlers, CLI) can map each kind to its own response.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for record store and facade operations
#[derive(Error, Debug)]
pub enum MentorError {
    /// A required request field was missing or blank
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The completion provider failed, timed out or returned nothing
    #[error("Completion failed: {0}")]
    Completion(String),

    /// The storage root could not be created or is not writable
    #[error("Failed to initialize storage at {}: {source}", path.display())]
    StorageInit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing a collection document failed
    #[error("Storage I/O error on {}: {source}", path.display())]
    StorageIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A collection document exists but does not parse
    #[error("Corrupt record document {}: {source}", path.display())]
    CorruptRecord {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Progress update for a user that was never saved
    #[error("User not found: {0}")]
    UserNotFound(String),
}

impl MentorError {
    /// Helper for required-field validation
    pub fn missing(field: &str) -> Self {
        MentorError::InvalidInput(format!("{} is required", field))
    }

    /// True for the storage-layer kinds
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            MentorError::StorageInit { .. }
                | MentorError::StorageIo { .. }
                | MentorError::CorruptRecord { .. }
        )
    }
}

/// Result type alias for mentor operations
pub type Result<T> = std::result::Result<T, MentorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message() {
        let err = MentorError::missing("question");
        assert_eq!(err.to_string(), "Invalid input: question is required");
        assert!(!err.is_storage());
    }

    #[test]
    fn test_storage_error_display() {
        let err = MentorError::StorageIo {
            path: PathBuf::from("/tmp/data/user-data.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("user-data.json"));
        assert!(err.to_string().contains("denied"));
        assert!(err.is_storage());
    }

    #[test]
    fn test_corrupt_record_is_storage() {
        let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = MentorError::CorruptRecord {
            path: PathBuf::from("conversations.json"),
            source,
        };
        assert!(err.is_storage());
        assert!(err.to_string().starts_with("Corrupt record document"));
    }
}
