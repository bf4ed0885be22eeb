//! Whole-file JSON documents with atomic replacement
//!
//! Every collection lives in one pretty-printed JSON file. Writes go to a
//! sibling `.tmp` file which is synced and then renamed over the target, so
//! a reader never observes a half-written document.

use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::error::{MentorError, Result};

/// One JSON document on disk plus the lock that serializes its mutations
pub struct DocumentFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DocumentFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire the document lock. Hold the guard across a read-modify-write.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }

    /// Whether the document exists on disk
    pub async fn exists(&self) -> Result<bool> {
        tokio::fs::try_exists(&self.path)
            .await
            .map_err(|source| self.io_error(source))
    }

    /// Read and parse the document. `Ok(None)` when the file is absent.
    pub async fn read<D: DeserializeOwned>(&self) -> Result<Option<D>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| self.corrupt(source))
    }

    /// Serialize and atomically replace the document
    pub async fn write<D: Serialize>(&self, document: &D) -> Result<()> {
        let json = serde_json::to_vec_pretty(document)
            .map_err(|source| self.corrupt(source))?;

        let tmp_path = self.tmp_path();
        let written = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(&json).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp_path, &self.path).await?;
            Ok::<(), std::io::Error>(())
        }
        .await;

        if let Err(source) = written {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(self.io_error(source));
        }

        debug!("Wrote {} bytes to {}", json.len(), self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    pub(crate) fn io_error(&self, source: std::io::Error) -> MentorError {
        MentorError::StorageIo {
            path: self.path.clone(),
            source,
        }
    }

    pub(crate) fn corrupt(&self, source: serde_json::Error) -> MentorError {
        MentorError::CorruptRecord {
            path: self.path.clone(),
            source,
        }
    }
}
