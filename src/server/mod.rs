//! Web server module
//!
//! JSON API over the mentor facade. Every capability is one POST route;
//! reads take the user from the `userId` query parameter.

pub mod http;

use anyhow::{Result, Context};
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::mentor::TechMentor;

/// User id applied when a request does not name one
pub const DEFAULT_WEB_USER: &str = "web-user";

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub mentor: Arc<TechMentor>,
}

impl ServerState {
    pub fn new(mentor: TechMentor) -> Self {
        Self {
            mentor: Arc::new(mentor),
        }
    }
}

/// Build the API router
pub fn router(state: ServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(http::health_handler))
        .route("/api/ask", post(http::ask_handler))
        .route("/api/explain-code", post(http::explain_code_handler))
        .route("/api/review-code", post(http::review_code_handler))
        .route("/api/debug", post(http::debug_handler))
        .route("/api/compare", post(http::compare_handler))
        .route("/api/resources", post(http::resources_handler))
        .route("/api/learning-path", post(http::learning_path_handler))
        .route("/api/learning-path/update", post(http::update_path_handler))
        .route("/api/next-step", post(http::next_step_handler))
        .route("/api/progress", post(http::progress_handler))
        .route("/api/stats", get(http::stats_handler))
        .route("/api/history", get(http::history_handler))
        .route("/api/users/{user_id}", delete(http::clear_user_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server
pub async fn start(config: &Config) -> Result<()> {
    let mentor = TechMentor::from_config(config).await?;
    let app = router(ServerState::new(mentor));

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.bind_address()))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    println!("Tech Mentor API listening on http://{}", addr);
    println!("  health check: http://{}/api/health", addr);
    info!("Server started on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
