//! HTTP handlers

use axum::{
    extract::{rejection::JsonRejection, Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::error::MentorError;
use crate::memory::Progress;
use crate::mentor::{
    AskQuestion, CompareConcepts, CreateLearningPath, ExplainCode, GetNextStep, HelpDebug,
    RecommendResources, ReviewCode, UpdateLearningPath,
};
use crate::server::{ServerState, DEFAULT_WEB_USER};

/// A capability request body with an optional `userId`
#[derive(Debug, Deserialize)]
pub struct UserRequest<T> {
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub request: T,
}

impl<T> UserRequest<T> {
    fn into_parts(self) -> (String, T) {
        (user_or_default(self.user_id), self.request)
    }
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub progress: Progress,
}

fn user_or_default(user_id: Option<String>) -> String {
    user_id
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_WEB_USER.to_string())
}

/// Map a facade error to its status code and `{error}` body
pub fn error_response(err: MentorError) -> Response {
    let status = match &err {
        MentorError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        MentorError::UserNotFound(_) => StatusCode::NOT_FOUND,
        MentorError::Completion(_) => StatusCode::BAD_GATEWAY,
        MentorError::StorageInit { .. }
        | MentorError::StorageIo { .. }
        | MentorError::CorruptRecord { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if err.is_storage() {
        warn!("Request failed: {}", err);
    }
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

fn respond<T: Serialize>(result: crate::error::Result<T>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Unwrap a JSON body, turning extractor rejections into the API's error shape
fn body<T: DeserializeOwned>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("Invalid request body: {}", rejection.body_text()) })),
        )
            .into_response()
    })
}

pub async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "message": "Tech Mentor API is running",
        "version": crate::VERSION,
    }))
}

pub async fn ask_handler(
    State(state): State<ServerState>,
    payload: Result<Json<UserRequest<AskQuestion>>, JsonRejection>,
) -> Response {
    let (user_id, request) = match body(payload) {
        Ok(req) => req.into_parts(),
        Err(rejection) => return rejection,
    };
    respond(state.mentor.ask_question(&user_id, request).await)
}

pub async fn explain_code_handler(
    State(state): State<ServerState>,
    payload: Result<Json<UserRequest<ExplainCode>>, JsonRejection>,
) -> Response {
    let (user_id, request) = match body(payload) {
        Ok(req) => req.into_parts(),
        Err(rejection) => return rejection,
    };
    respond(state.mentor.explain_code(&user_id, request).await)
}

pub async fn review_code_handler(
    State(state): State<ServerState>,
    payload: Result<Json<UserRequest<ReviewCode>>, JsonRejection>,
) -> Response {
    let (user_id, request) = match body(payload) {
        Ok(req) => req.into_parts(),
        Err(rejection) => return rejection,
    };
    respond(state.mentor.review_code(&user_id, request).await)
}

pub async fn debug_handler(
    State(state): State<ServerState>,
    payload: Result<Json<UserRequest<HelpDebug>>, JsonRejection>,
) -> Response {
    let (user_id, request) = match body(payload) {
        Ok(req) => req.into_parts(),
        Err(rejection) => return rejection,
    };
    respond(state.mentor.help_debug(&user_id, request).await)
}

pub async fn compare_handler(
    State(state): State<ServerState>,
    payload: Result<Json<UserRequest<CompareConcepts>>, JsonRejection>,
) -> Response {
    let (user_id, request) = match body(payload) {
        Ok(req) => req.into_parts(),
        Err(rejection) => return rejection,
    };
    respond(state.mentor.compare_concepts(&user_id, request).await)
}

pub async fn resources_handler(
    State(state): State<ServerState>,
    payload: Result<Json<UserRequest<RecommendResources>>, JsonRejection>,
) -> Response {
    let (user_id, request) = match body(payload) {
        Ok(req) => req.into_parts(),
        Err(rejection) => return rejection,
    };
    respond(state.mentor.recommend_resources(&user_id, request).await)
}

pub async fn learning_path_handler(
    State(state): State<ServerState>,
    payload: Result<Json<UserRequest<CreateLearningPath>>, JsonRejection>,
) -> Response {
    let (user_id, request) = match body(payload) {
        Ok(req) => req.into_parts(),
        Err(rejection) => return rejection,
    };
    respond(state.mentor.create_learning_path(&user_id, request).await)
}

pub async fn update_path_handler(
    State(state): State<ServerState>,
    payload: Result<Json<UserRequest<UpdateLearningPath>>, JsonRejection>,
) -> Response {
    let (user_id, request) = match body(payload) {
        Ok(req) => req.into_parts(),
        Err(rejection) => return rejection,
    };
    respond(state.mentor.update_learning_path(&user_id, request).await)
}

pub async fn next_step_handler(
    State(state): State<ServerState>,
    payload: Result<Json<UserRequest<GetNextStep>>, JsonRejection>,
) -> Response {
    let (user_id, request) = match body(payload) {
        Ok(req) => req.into_parts(),
        Err(rejection) => return rejection,
    };
    respond(state.mentor.get_next_step(&user_id, request).await)
}

pub async fn progress_handler(
    State(state): State<ServerState>,
    payload: Result<Json<ProgressRequest>, JsonRejection>,
) -> Response {
    let request = match body(payload) {
        Ok(req) => req,
        Err(rejection) => return rejection,
    };
    let user_id = user_or_default(request.user_id);
    respond(
        state
            .mentor
            .update_progress(&user_id, request.progress)
            .await
            .map(|progress| json!({ "userId": user_id, "progress": progress })),
    )
}

pub async fn stats_handler(
    State(state): State<ServerState>,
    Query(query): Query<UserQuery>,
) -> Response {
    let user_id = user_or_default(query.user_id);
    respond(state.mentor.get_statistics(&user_id).await)
}

pub async fn history_handler(
    State(state): State<ServerState>,
    Query(query): Query<UserQuery>,
) -> Response {
    let user_id = user_or_default(query.user_id);
    respond(state.mentor.get_learning_history(&user_id).await)
}

pub async fn clear_user_handler(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Response {
    respond(state.mentor.clear_user_data(&user_id).await)
}
