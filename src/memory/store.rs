//! Record store - users, conversations and learning paths under one root
//!
//! The store is an explicitly constructed object; callers share it through
//! an `Arc`. Each collection serializes its own mutations, so concurrent
//! calls inside one process never drop each other's writes.

use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{
    Collection, ConversationRecord, LearningPath, LearningPathRecord, NewConversation, Progress,
    Statistics, UserFields, UserRecord, UserTable, CONVERSATIONS_FILE, LEARNING_PATHS_FILE,
    USERS_FILE,
};
use crate::error::{MentorError, Result};

/// Conversations returned when no limit is given
pub const DEFAULT_CONVERSATION_LIMIT: usize = 10;

const WRITE_PROBE: &str = ".write-probe";

/// What `clear_user_data` removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearReport {
    pub user_removed: bool,
    pub conversations_removed: usize,
    pub learning_paths_removed: usize,
}

/// Durable storage for the three record collections
pub struct RecordStore {
    root: PathBuf,
    users: UserTable,
    conversations: Collection<ConversationRecord>,
    learning_paths: Collection<LearningPathRecord>,
}

impl RecordStore {
    /// Create a store rooted at `root`. Nothing touches the disk until
    /// `initialize` or the first operation.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            users: UserTable::new(root.join(USERS_FILE)),
            conversations: Collection::new(root.join(CONVERSATIONS_FILE)),
            learning_paths: Collection::new(root.join(LEARNING_PATHS_FILE)),
            root,
        }
    }

    /// Create and initialize in one step
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(root);
        store.initialize().await?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensure the storage root exists and is writable, and that each
    /// collection document exists. Safe to call on every start.
    pub async fn initialize(&self) -> Result<()> {
        let init_error = |source: std::io::Error| MentorError::StorageInit {
            path: self.root.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.root).await.map_err(init_error)?;

        let probe = self.root.join(WRITE_PROBE);
        tokio::fs::write(&probe, b"ok").await.map_err(init_error)?;
        tokio::fs::remove_file(&probe).await.map_err(init_error)?;

        let created = [
            self.users.ensure().await.map_err(into_init_error)?,
            self.conversations.ensure().await.map_err(into_init_error)?,
            self.learning_paths.ensure().await.map_err(into_init_error)?,
        ];

        info!(
            "Record store ready at {} ({} new document(s))",
            self.root.display(),
            created.iter().filter(|c| **c).count()
        );
        Ok(())
    }

    /// Create the user, or merge `fields` into the existing record
    pub async fn save_user(&self, user_id: &str, fields: UserFields) -> Result<UserRecord> {
        self.users.upsert(user_id, fields).await
    }

    /// Create the user with no fields if absent
    pub async fn ensure_user(&self, user_id: &str) -> Result<bool> {
        self.users.ensure_user(user_id).await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>> {
        self.users.get(user_id).await
    }

    /// Append a conversation, assigning its id and timestamp
    pub async fn save_conversation(
        &self,
        user_id: &str,
        conversation: NewConversation,
    ) -> Result<ConversationRecord> {
        let user_id = user_id.to_string();
        self.conversations
            .append_with(move |id| ConversationRecord {
                id,
                user_id,
                timestamp: Utc::now(),
                kind: conversation.kind,
                input: conversation.input,
                output: conversation.output,
            })
            .await
    }

    /// A user's conversations, newest first. `None` applies the default limit.
    pub async fn get_conversations(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ConversationRecord>> {
        let limit = limit.unwrap_or(DEFAULT_CONVERSATION_LIMIT);
        self.conversations.query_by_owner(user_id, Some(limit)).await
    }

    /// Append a learning path, assigning its id and `createdAt`
    pub async fn save_learning_path(
        &self,
        user_id: &str,
        path: LearningPath,
    ) -> Result<LearningPathRecord> {
        let user_id = user_id.to_string();
        self.learning_paths
            .append_with(move |id| LearningPathRecord {
                id,
                user_id,
                created_at: Utc::now(),
                path,
            })
            .await
    }

    /// Every learning path of a user, newest first
    pub async fn get_learning_paths(&self, user_id: &str) -> Result<Vec<LearningPathRecord>> {
        self.learning_paths.query_by_owner(user_id, None).await
    }

    /// Shallow-merge into the user's progress. Fails with `UserNotFound`
    /// for users that were never saved.
    pub async fn update_progress(&self, user_id: &str, progress: Progress) -> Result<Progress> {
        self.users.update_progress(user_id, progress).await
    }

    pub async fn get_statistics(&self, user_id: &str) -> Result<Statistics> {
        let user = self.users.get(user_id).await?;
        let total_conversations = self.conversations.count_by_owner(user_id).await?;
        let total_learning_paths = self.learning_paths.count_by_owner(user_id).await?;
        let newest = self.conversations.query_by_owner(user_id, Some(1)).await?;

        let joined_at = user.as_ref().map(|u| u.created_at);
        let last_active = newest.first().map(|c| c.timestamp).or(joined_at);

        Ok(Statistics {
            total_conversations,
            total_learning_paths,
            current_progress: user.and_then(|u| u.progress).unwrap_or_default(),
            joined_at,
            last_active,
        })
    }

    /// Remove everything owned by `user_id`.
    ///
    /// Collections are cleared one at a time: conversations, learning paths,
    /// then the user record. Every document stays valid if this is
    /// interrupted, and running it again finishes the job.
    pub async fn clear_user_data(&self, user_id: &str) -> Result<ClearReport> {
        let conversations_removed = self.conversations.delete_by_owner(user_id).await?;
        let learning_paths_removed = self.learning_paths.delete_by_owner(user_id).await?;
        let user_removed = self.users.remove(user_id).await?;

        let report = ClearReport {
            user_removed,
            conversations_removed,
            learning_paths_removed,
        };
        if report == ClearReport::default() {
            warn!("Clear requested for {} but nothing was stored", user_id);
        } else {
            info!(
                "Cleared data for {}: {} conversation(s), {} learning path(s)",
                user_id, conversations_removed, learning_paths_removed
            );
        }
        Ok(report)
    }
}

fn into_init_error(err: MentorError) -> MentorError {
    match err {
        MentorError::StorageIo { path, source } => MentorError::StorageInit { path, source },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConversationType;
    use serde_json::json;

    fn conversation(kind: ConversationType) -> NewConversation {
        NewConversation {
            kind,
            input: json!({}),
            output: json!({}),
        }
    }

    #[tokio::test]
    async fn test_initialize_creates_documents() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        let store = RecordStore::open(&root).await.unwrap();

        for file in [USERS_FILE, CONVERSATIONS_FILE, LEARNING_PATHS_FILE] {
            assert!(root.join(file).exists(), "{} missing", file);
        }
        assert!(!root.join(WRITE_PROBE).exists());

        let conversations: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(root.join(CONVERSATIONS_FILE)).unwrap())
                .unwrap();
        assert_eq!(conversations["conversations"], json!([]));
        assert!(conversations["createdAt"].is_string());

        let users: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(root.join(USERS_FILE)).unwrap()).unwrap();
        assert_eq!(users["users"], json!({}));

        // Second call leaves existing data alone
        store.ensure_user("u1").await.unwrap();
        store.initialize().await.unwrap();
        assert!(store.get_user("u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_initialize_fails_when_root_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("occupied");
        std::fs::write(&root, "not a directory").unwrap();

        let err = RecordStore::open(&root).await.err().unwrap();
        assert!(matches!(err, MentorError::StorageInit { .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_default_limit() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(dir.path()).await.unwrap();

        for _ in 0..(DEFAULT_CONVERSATION_LIMIT + 3) {
            store
                .save_conversation("u1", conversation(ConversationType::QuestionAnswer))
                .await
                .unwrap();
        }

        let recent = store.get_conversations("u1", None).await.unwrap();
        assert_eq!(recent.len(), DEFAULT_CONVERSATION_LIMIT);
        let all = store.get_conversations("u1", Some(100)).await.unwrap();
        assert_eq!(all.len(), DEFAULT_CONVERSATION_LIMIT + 3);
    }

    #[tokio::test]
    async fn test_ids_unique_and_increasing() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(dir.path()).await.unwrap();

        let mut ids = Vec::new();
        for _ in 0..20 {
            let record = store
                .save_conversation("u1", conversation(ConversationType::CodeReview))
                .await
                .unwrap();
            ids.push(record.id.parse::<u64>().unwrap());
        }
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids not increasing: {:?}", ids);
    }

    #[tokio::test]
    async fn test_statistics_last_active_falls_back_to_joined() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(dir.path()).await.unwrap();

        let user = store.save_user("u1", UserFields::default()).await.unwrap();
        let stats = store.get_statistics("u1").await.unwrap();
        assert_eq!(stats.joined_at, Some(user.created_at));
        assert_eq!(stats.last_active, Some(user.created_at));

        let saved = store
            .save_conversation("u1", conversation(ConversationType::DebugHelp))
            .await
            .unwrap();
        let stats = store.get_statistics("u1").await.unwrap();
        assert_eq!(stats.total_conversations, 1);
        assert_eq!(stats.last_active, Some(saved.timestamp));
    }

    #[tokio::test]
    async fn test_corrupt_document_blocks_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(dir.path()).await.unwrap();
        let path = dir.path().join(CONVERSATIONS_FILE);
        std::fs::write(&path, "garbage").unwrap();

        let err = store
            .save_conversation("u1", conversation(ConversationType::QuestionAnswer))
            .await
            .unwrap_err();
        assert!(matches!(err, MentorError::CorruptRecord { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "garbage");
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(RecordStore::open(dir.path()).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .save_conversation(&format!("user-{}", i % 4), conversation(ConversationType::QuestionAnswer))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut total = 0;
        for u in 0..4 {
            total += store.get_conversations(&format!("user-{}", u), Some(100)).await.unwrap().len();
        }
        assert_eq!(total, 16);
    }
}
