//! Health check endpoint.

use axum::{extract::State, routing::get, Json, Router};
use banner_engine::SnapshotSummary;
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub max_active: usize,
    pub connections: usize,
}

/// Create health routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        max_active: state.config.max_active,
        connections: state.conn_manager.connection_count(),
    })
}

/// Root handler: a summary of the current ranking.
async fn root(State(state): State<AppState>) -> Json<SnapshotSummary> {
    Json(SnapshotSummary::from(&state.engine.snapshot()))
}
