//! Users table - one keyed document of user profiles
//!
//! Merge rule: incoming fields override existing ones key by key. `progress`
//! is the only nested mapping that is merged instead of replaced. The
//! store-managed fields `id`, `createdAt` and `updatedAt` cannot be set by
//! callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::document::DocumentFile;
use super::Progress;
use crate::error::{MentorError, Result};

const RESERVED_FIELDS: &[&str] = &["id", "createdAt", "updatedAt", "progress"];

/// Key stamped into `progress` on every progress update
pub const PROGRESS_STAMP: &str = "lastUpdated";

/// A stored user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    /// Any other profile fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Fields supplied to `save_user`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFields {
    pub progress: Option<Progress>,
    pub extra: Map<String, Value>,
}

impl UserFields {
    /// Split a loose JSON object into progress and profile fields
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        let progress = match map.remove("progress") {
            Some(Value::Object(p)) => Some(p),
            _ => None,
        };
        for key in RESERVED_FIELDS {
            map.remove(*key);
        }
        Self {
            progress,
            extra: map,
        }
    }

    pub fn with_progress(progress: Progress) -> Self {
        Self {
            progress: Some(progress),
            extra: Map::new(),
        }
    }
}

impl UserRecord {
    /// A fresh record with `fields` applied and no `updatedAt`
    pub fn new(id: &str, fields: UserFields, now: DateTime<Utc>) -> Self {
        let mut record = Self {
            id: id.to_string(),
            created_at: now,
            updated_at: None,
            progress: None,
            extra: Map::new(),
        };
        record.apply(fields);
        record
    }

    /// Merge `fields` into this record and stamp `updatedAt`
    pub fn merge(&mut self, fields: UserFields, now: DateTime<Utc>) {
        self.apply(fields);
        self.updated_at = Some(now);
    }

    fn apply(&mut self, fields: UserFields) {
        if let Some(incoming) = fields.progress {
            let progress = self.progress.get_or_insert_with(Map::new);
            for (key, value) in incoming {
                progress.insert(key, value);
            }
        }
        for (key, value) in fields.extra {
            if RESERVED_FIELDS.contains(&key.as_str()) {
                continue;
            }
            self.extra.insert(key, value);
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsersDocument {
    users: BTreeMap<String, UserRecord>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl UsersDocument {
    fn empty() -> Self {
        Self {
            users: BTreeMap::new(),
            created_at: Some(Utc::now()),
        }
    }
}

/// File-backed table of user profiles
pub struct UserTable {
    doc: DocumentFile,
}

impl UserTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            doc: DocumentFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.doc.path()
    }

    /// Create an empty users document if absent
    pub async fn ensure(&self) -> Result<bool> {
        let _guard = self.doc.lock().await;
        if self.doc.exists().await? {
            return Ok(false);
        }
        self.doc.write(&UsersDocument::empty()).await?;
        info!("Created empty users table at {}", self.path().display());
        Ok(true)
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<UserRecord>> {
        let _guard = self.doc.lock().await;
        let mut document = self.load().await?;
        Ok(document.users.remove(user_id))
    }

    /// Create or merge a user
    pub async fn upsert(&self, user_id: &str, fields: UserFields) -> Result<UserRecord> {
        let _guard = self.doc.lock().await;
        let mut document = self.load().await?;
        let now = Utc::now();

        let record = match document.users.get_mut(user_id) {
            Some(existing) => {
                existing.merge(fields, now);
                existing.clone()
            }
            None => {
                let created = UserRecord::new(user_id, fields, now);
                document.users.insert(user_id.to_string(), created.clone());
                info!("Created user {}", user_id);
                created
            }
        };

        self.doc.write(&document).await?;
        Ok(record)
    }

    /// Create the user with no fields when absent; never touches an existing one.
    /// Returns true when the user was created.
    pub async fn ensure_user(&self, user_id: &str) -> Result<bool> {
        let _guard = self.doc.lock().await;
        let mut document = self.load().await?;
        if document.users.contains_key(user_id) {
            return Ok(false);
        }

        let created = UserRecord::new(user_id, UserFields::default(), Utc::now());
        document.users.insert(user_id.to_string(), created);
        self.doc.write(&document).await?;
        info!("Created user {} on first activity", user_id);
        Ok(true)
    }

    /// Merge into an existing user's progress and stamp `lastUpdated`
    pub async fn update_progress(&self, user_id: &str, mut fields: Progress) -> Result<Progress> {
        let _guard = self.doc.lock().await;
        let mut document = self.load().await?;
        let now = Utc::now();

        let user = document
            .users
            .get_mut(user_id)
            .ok_or_else(|| MentorError::UserNotFound(user_id.to_string()))?;

        fields.insert(PROGRESS_STAMP.to_string(), Value::String(now.to_rfc3339()));
        user.merge(UserFields::with_progress(fields), now);
        let progress = user.progress.clone().unwrap_or_default();

        self.doc.write(&document).await?;
        debug!("Updated progress for {}", user_id);
        Ok(progress)
    }

    /// Remove a user. Returns true if the user existed.
    pub async fn remove(&self, user_id: &str) -> Result<bool> {
        let _guard = self.doc.lock().await;
        let mut document = self.load().await?;
        let existed = document.users.remove(user_id).is_some();
        if existed {
            self.doc.write(&document).await?;
        }
        Ok(existed)
    }

    async fn load(&self) -> Result<UsersDocument> {
        Ok(self.doc.read().await?.unwrap_or_else(UsersDocument::empty))
    }
}
