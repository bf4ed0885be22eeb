//! HTTP API over a temporary store and a scripted completion provider

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tech_mentor::agent::TextCompletion;
use tech_mentor::memory::RecordStore;
use tech_mentor::mentor::TechMentor;
use tech_mentor::server::{router, ServerState};
use tempfile::TempDir;
use tower::ServiceExt;

/// Answers every prompt with a fixed text, or fails when `reply` is None
struct ScriptedCompletion {
    reply: Option<&'static str>,
    calls: AtomicUsize,
}

#[async_trait]
impl TextCompletion for ScriptedCompletion {
    async fn complete(&self, _system: &str, _prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            Some(text) => Ok(text.to_string()),
            None => anyhow::bail!("upstream returned 503"),
        }
    }
}

struct TestApp {
    app: Router,
    completion: Arc<ScriptedCompletion>,
    _dir: TempDir,
}

async fn test_app(reply: Option<&'static str>) -> TestApp {
    let dir = TempDir::new().unwrap();
    let store = RecordStore::open(dir.path()).await.unwrap();
    let completion = Arc::new(ScriptedCompletion {
        reply,
        calls: AtomicUsize::new(0),
    });
    let mentor = TechMentor::new(Arc::new(store), completion.clone());
    TestApp {
        app: router(ServerState::new(mentor)),
        completion,
        _dir: dir,
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let t = test_app(Some("unused")).await;
    let (status, body) = send(&t.app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ask_then_stats_and_history() {
    let t = test_app(Some("Borrowing lends access without moving.")).await;

    let (status, body) = send(
        &t.app,
        "POST",
        "/api/ask",
        Some(json!({ "userId": "u1", "question": "What is borrowing?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["question"], "What is borrowing?");
    assert_eq!(body["answer"], "Borrowing lends access without moving.");
    assert!(body["answeredAt"].is_string());
    assert!(body.get("persistenceWarning").is_none());

    let (status, stats) = send(&t.app, "GET", "/api/stats?userId=u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalConversations"], 1);
    assert!(stats["joinedAt"].is_string());

    let (_, history) = send(&t.app, "GET", "/api/history?userId=u1", None).await;
    assert_eq!(history["recentConversations"][0]["type"], "question_answer");
    assert_eq!(history["learningPaths"], json!([]));
}

#[tokio::test]
async fn test_missing_field_is_bad_request_without_completion() {
    let t = test_app(Some("unused")).await;
    let (status, body) = send(&t.app, "POST", "/api/ask", Some(json!({ "question": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid input: question is required");
    assert_eq!(t.completion.calls.load(Ordering::SeqCst), 0);

    let (status, stats) = send(&t.app, "GET", "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalConversations"], 0);
    assert_eq!(stats["joinedAt"], Value::Null);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let t = test_app(Some("unused")).await;
    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/compare")
                .header("content-type", "application/json")
                .body(Body::from("{ not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_completion_failure_is_bad_gateway() {
    let t = test_app(None).await;
    let (status, body) = send(
        &t.app,
        "POST",
        "/api/explain-code",
        Some(json!({ "code": "let x = 5;" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("503"));

    let (_, stats) = send(&t.app, "GET", "/api/stats?userId=web-user", None).await;
    assert_eq!(stats["totalConversations"], 0);
}

#[tokio::test]
async fn test_learning_path_flow() {
    let t = test_app(Some("Week 1: syntax")).await;

    let (status, body) = send(
        &t.app,
        "POST",
        "/api/learning-path",
        Some(json!({ "userId": "u2", "technology": "Rust" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["technology"], "Rust");
    assert_eq!(body["goal"], "Learn Rust");
    assert_eq!(body["learningPath"], "Week 1: syntax");

    let (status, body) = send(
        &t.app,
        "POST",
        "/api/learning-path/update",
        Some(json!({ "userId": "u2", "currentPath": "Week 1: syntax", "feedback": "too slow" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["updatedPath"].is_string());

    let (_, stats) = send(&t.app, "GET", "/api/stats?userId=u2", None).await;
    assert_eq!(stats["totalLearningPaths"], 1);
    assert_eq!(stats["totalConversations"], 2);
}

#[tokio::test]
async fn test_progress_requires_existing_user() {
    let t = test_app(Some("ok")).await;

    let (status, _) = send(
        &t.app,
        "POST",
        "/api/progress",
        Some(json!({ "userId": "ghost", "progress": { "rust": "ch1" } })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(
        &t.app,
        "POST",
        "/api/resources",
        Some(json!({ "userId": "u3", "topic": "tokio" })),
    )
    .await;
    let (status, body) = send(
        &t.app,
        "POST",
        "/api/progress",
        Some(json!({ "userId": "u3", "progress": { "rust": "ch1" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["progress"]["rust"], "ch1");
}

#[tokio::test]
async fn test_delete_user() {
    let t = test_app(Some("answer")).await;
    send(
        &t.app,
        "POST",
        "/api/debug",
        Some(json!({ "userId": "u4", "code": "v[9]", "error": "index out of bounds" })),
    )
    .await;

    let (status, report) = send(&t.app, "DELETE", "/api/users/u4", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["userRemoved"], true);
    assert_eq!(report["conversationsRemoved"], 1);

    let (_, stats) = send(&t.app, "GET", "/api/stats?userId=u4", None).await;
    assert_eq!(stats["totalConversations"], 0);
    assert_eq!(stats["joinedAt"], Value::Null);
}
