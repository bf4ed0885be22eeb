//! Record store behaviour across users and collections

use serde_json::json;
use tech_mentor::error::MentorError;
use tech_mentor::memory::{
    LearningPath, NewConversation, Progress, RecordStore, UserFields, CONVERSATIONS_FILE,
    LEARNING_PATHS_FILE, USERS_FILE,
};
use tech_mentor::types::ConversationType;
use tempfile::TempDir;

async fn open_store() -> (RecordStore, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = RecordStore::open(dir.path()).await.unwrap();
    (store, dir)
}

fn conversation(kind: ConversationType, text: &str) -> NewConversation {
    NewConversation {
        kind,
        input: json!({ "text": text }),
        output: json!({ "answer": format!("re: {}", text) }),
    }
}

fn path(technology: &str) -> LearningPath {
    LearningPath {
        technology: technology.to_string(),
        current_level: "beginner".to_string(),
        goal: format!("Learn {}", technology),
        learning_path: "1. Basics".to_string(),
        generated_at: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn test_conversations_are_newest_first() {
    let (store, _dir) = open_store().await;
    store
        .save_conversation("u1", conversation(ConversationType::QuestionAnswer, "first"))
        .await
        .unwrap();
    store
        .save_conversation("u1", conversation(ConversationType::CodeReview, "second"))
        .await
        .unwrap();

    let kinds: Vec<_> = store
        .get_conversations("u1", Some(10))
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![ConversationType::CodeReview, ConversationType::QuestionAnswer]
    );
}

#[tokio::test]
async fn test_users_cannot_see_each_other() {
    let (store, _dir) = open_store().await;
    store
        .save_conversation("alice", conversation(ConversationType::DebugHelp, "a"))
        .await
        .unwrap();
    store.save_learning_path("alice", path("Rust")).await.unwrap();
    store
        .save_conversation("bob", conversation(ConversationType::CodeExplanation, "b"))
        .await
        .unwrap();

    let bob = store.get_conversations("bob", None).await.unwrap();
    assert_eq!(bob.len(), 1);
    assert!(bob.iter().all(|c| c.user_id == "bob"));
    assert!(store.get_learning_paths("bob").await.unwrap().is_empty());
    assert_eq!(store.get_learning_paths("alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_user_statistics() {
    let (store, _dir) = open_store().await;
    let stats = store.get_statistics("new-user").await.unwrap();
    assert_eq!(
        serde_json::to_value(&stats).unwrap(),
        json!({
            "totalConversations": 0,
            "totalLearningPaths": 0,
            "currentProgress": {},
            "joinedAt": null,
            "lastActive": null
        })
    );
}

#[tokio::test]
async fn test_statistics_count_past_the_default_limit() {
    let (store, _dir) = open_store().await;
    store.save_user("u1", UserFields::default()).await.unwrap();
    for i in 0..12 {
        store
            .save_conversation("u1", conversation(ConversationType::QuestionAnswer, &i.to_string()))
            .await
            .unwrap();
    }

    assert_eq!(store.get_conversations("u1", None).await.unwrap().len(), 10);
    let stats = store.get_statistics("u1").await.unwrap();
    assert_eq!(stats.total_conversations, 12);
    let newest = store.get_conversations("u1", Some(1)).await.unwrap();
    assert_eq!(stats.last_active, Some(newest[0].timestamp));
}

#[tokio::test]
async fn test_save_user_merges_profile_and_progress() {
    let (store, _dir) = open_store().await;
    let mut fields = serde_json::Map::new();
    fields.insert("name".to_string(), json!("Ada"));
    fields.insert("progress".to_string(), json!({ "rust": "ch1", "go": "ch2" }));
    let created = store.save_user("u1", UserFields::from_map(fields)).await.unwrap();
    assert!(created.updated_at.is_none());

    let mut fields = serde_json::Map::new();
    fields.insert("name".to_string(), json!("Ada L."));
    fields.insert("progress".to_string(), json!({ "rust": "ch3" }));
    let merged = store.save_user("u1", UserFields::from_map(fields)).await.unwrap();

    assert_eq!(merged.created_at, created.created_at);
    assert!(merged.updated_at.is_some());
    assert_eq!(merged.extra["name"], json!("Ada L."));
    let progress = merged.progress.unwrap();
    assert_eq!(progress["rust"], json!("ch3"));
    assert_eq!(progress["go"], json!("ch2"));
}

#[tokio::test]
async fn test_update_progress() {
    let (store, _dir) = open_store().await;
    let mut progress = Progress::new();
    progress.insert("rust".to_string(), json!("ch4"));

    let err = store.update_progress("ghost", progress.clone()).await.unwrap_err();
    assert!(matches!(err, MentorError::UserNotFound(_)));

    store.save_user("u1", UserFields::default()).await.unwrap();
    let merged = store.update_progress("u1", progress).await.unwrap();
    assert_eq!(merged["rust"], json!("ch4"));
    assert!(merged["lastUpdated"].is_string());

    let stats = store.get_statistics("u1").await.unwrap();
    assert_eq!(stats.current_progress["rust"], json!("ch4"));
}

#[tokio::test]
async fn test_clear_user_data_leaves_others() {
    let (store, _dir) = open_store().await;
    for user in ["u1", "u2"] {
        store.save_user(user, UserFields::default()).await.unwrap();
        store
            .save_conversation(user, conversation(ConversationType::QuestionAnswer, user))
            .await
            .unwrap();
        store.save_learning_path(user, path("Go")).await.unwrap();
    }

    let report = store.clear_user_data("u1").await.unwrap();
    assert!(report.user_removed);
    assert_eq!(report.conversations_removed, 1);
    assert_eq!(report.learning_paths_removed, 1);

    assert!(store.get_user("u1").await.unwrap().is_none());
    assert!(store.get_conversations("u1", None).await.unwrap().is_empty());
    assert_eq!(store.get_conversations("u2", None).await.unwrap().len(), 1);
    assert!(store.get_user("u2").await.unwrap().is_some());

    // Clearing again is harmless
    let again = store.clear_user_data("u1").await.unwrap();
    assert!(!again.user_removed);
    assert_eq!(again.conversations_removed, 0);
}

#[tokio::test]
async fn test_records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = RecordStore::open(dir.path()).await.unwrap();
        store
            .save_conversation("u1", conversation(ConversationType::NextStepSuggestion, "x"))
            .await
            .unwrap();
    }

    let reopened = RecordStore::open(dir.path()).await.unwrap();
    let conversations = reopened.get_conversations("u1", None).await.unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].kind, ConversationType::NextStepSuggestion);
}

#[tokio::test]
async fn test_document_layout_on_disk() {
    let (store, dir) = open_store().await;
    store.save_user("u1", UserFields::default()).await.unwrap();
    store.save_learning_path("u1", path("Rust")).await.unwrap();

    let users: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join(USERS_FILE)).unwrap()).unwrap();
    assert!(users["users"]["u1"]["createdAt"].is_string());
    assert!(users["createdAt"].is_string());

    let paths: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join(LEARNING_PATHS_FILE)).unwrap(),
    )
    .unwrap();
    assert_eq!(paths["paths"][0]["technology"], "Rust");
    assert_eq!(paths["paths"][0]["userId"], "u1");

    let conversations: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join(CONVERSATIONS_FILE)).unwrap(),
    )
    .unwrap();
    assert_eq!(conversations["conversations"], json!([]));
}

#[tokio::test]
async fn test_missing_document_reads_as_empty() {
    let (store, dir) = open_store().await;
    std::fs::remove_file(dir.path().join(CONVERSATIONS_FILE)).unwrap();

    assert!(store.get_conversations("u1", None).await.unwrap().is_empty());
    store
        .save_conversation("u1", conversation(ConversationType::QuestionAnswer, "again"))
        .await
        .unwrap();
    assert_eq!(store.get_conversations("u1", None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_learning_path_round_trips() {
    let (store, _dir) = open_store().await;
    let saved = path("Kubernetes");
    store.save_learning_path("u1", saved.clone()).await.unwrap();

    let paths = store.get_learning_paths("u1").await.unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].path, saved);
    assert_eq!(paths[0].user_id, "u1");
}

#[tokio::test]
async fn test_limit_returns_most_recent_ids() {
    let (store, _dir) = open_store().await;
    let mut ids = Vec::new();
    for i in 0..5 {
        let record = store
            .save_conversation("u1", conversation(ConversationType::QuestionAnswer, &i.to_string()))
            .await
            .unwrap();
        ids.push(record.id);
    }

    let recent: Vec<_> = store
        .get_conversations("u1", Some(2))
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(recent, vec![ids[4].clone(), ids[3].clone()]);
}

#[tokio::test]
async fn test_reads_existing_data_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("user-data.json"),
        r#"{
  "users": {
    "u1": {
      "id": "u1",
      "createdAt": "2024-04-01T09:00:00Z",
      "progress": { "rust": "ch2" }
    }
  },
  "createdAt": "2024-04-01T09:00:00Z"
}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join(CONVERSATIONS_FILE),
        r#"{
  "conversations": [
    {
      "id": "1714557600000",
      "userId": "u1",
      "timestamp": "2024-05-01T10:00:00Z",
      "type": "question_answer",
      "input": { "question": "What is ownership?" },
      "output": { "answer": "..." }
    }
  ],
  "createdAt": "2024-04-01T09:00:00Z"
}"#,
    )
    .unwrap();

    let store = RecordStore::open(dir.path()).await.unwrap();
    assert!(store.get_user("u1").await.unwrap().is_some());

    let stats = store.get_statistics("u1").await.unwrap();
    assert_eq!(stats.total_conversations, 1);
    assert_eq!(stats.current_progress["rust"], json!("ch2"));
    assert_eq!(stats.joined_at, Some("2024-04-01T09:00:00Z".parse().unwrap()));

    let mut progress = Progress::new();
    progress.insert("rust".to_string(), json!("ch3"));
    let merged = store.update_progress("u1", progress).await.unwrap();
    assert_eq!(merged["rust"], json!("ch3"));
}
