//! Persistent record store
//!
//! Provides:
//! - A users table keyed by user id, with shallow-merged profile and progress
//! - An append-only conversation log
//! - An append-only learning-path log
//!
//! Each collection is one JSON document under the storage root, rewritten
//! in full on every mutation while its per-collection lock is held.

pub mod collection;
pub mod document;
pub mod store;
pub mod users;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::ConversationType;

pub use collection::{Collection, OwnedRecord};
pub use store::{ClearReport, RecordStore, DEFAULT_CONVERSATION_LIMIT};
pub use users::{UserFields, UserRecord, UserTable};

/// Open-ended progress mapping stored on a user
pub type Progress = Map<String, Value>;

/// File names of the three collection documents
pub const USERS_FILE: &str = "user-data.json";
pub const CONVERSATIONS_FILE: &str = "conversations.json";
pub const LEARNING_PATHS_FILE: &str = "learning-paths.json";

/// A stored exchange between a user and the mentor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ConversationType,
    pub input: Value,
    pub output: Value,
}

/// Caller-supplied part of a conversation record
#[derive(Debug, Clone, PartialEq)]
pub struct NewConversation {
    pub kind: ConversationType,
    pub input: Value,
    pub output: Value,
}

impl OwnedRecord for ConversationRecord {
    const KEY: &'static str = "conversations";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> &str {
        &self.user_id
    }

    fn recency(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// A generated learning path, as returned by the planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPath {
    pub technology: String,
    pub current_level: String,
    pub goal: String,
    pub learning_path: String,
    pub generated_at: DateTime<Utc>,
}

/// A learning path as stored, with store-assigned fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPathRecord {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub path: LearningPath,
}

impl OwnedRecord for LearningPathRecord {
    const KEY: &'static str = "paths";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> &str {
        &self.user_id
    }

    fn recency(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Per-user activity summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_conversations: usize,
    pub total_learning_paths: usize,
    pub current_progress: Progress,
    pub joined_at: Option<DateTime<Utc>>,
    pub last_active: Option<DateTime<Utc>>,
}
