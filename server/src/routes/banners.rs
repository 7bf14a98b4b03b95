//! Banner ranking routes.

use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    http::StatusCode,
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use banner_engine::{EngineSnapshot, Item};

use crate::error::Result;
use crate::handlers::{
    handle_demote, handle_flush, handle_promote, handle_refresh, handle_reorder,
    handle_websocket_connection, FlushResponse, RefreshResponse, ReorderRequest,
};
use crate::AppState;

/// Create banner routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/banners", get(list_handler))
        .route("/banners/order", put(reorder_handler))
        .route("/banners/order/flush", post(flush_handler))
        .route("/banners/refresh", post(refresh_handler))
        .route("/banners/{id}/promote", post(promote_handler))
        .route("/banners/{id}/demote", post(demote_handler))
        .route("/ws", get(ws_handler))
}

/// GET /banners - Current snapshot.
async fn list_handler(State(state): State<AppState>) -> Json<EngineSnapshot> {
    Json(state.engine.snapshot())
}

/// PUT /banners/order - Propose a reorder; committed after the quiet period.
async fn reorder_handler(
    State(state): State<AppState>,
    Json(request): Json<ReorderRequest>,
) -> Result<(StatusCode, Json<EngineSnapshot>)> {
    let snapshot = handle_reorder(&state.engine, request)?;
    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

/// POST /banners/order/flush - Commit the pending reorder now.
async fn flush_handler(State(state): State<AppState>) -> Result<Json<FlushResponse>> {
    Ok(Json(handle_flush(&state.engine)?))
}

/// POST /banners/{id}/promote - Activate a parked banner.
async fn promote_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Item>> {
    Ok(Json(handle_promote(&state.engine, &id).await?))
}

/// POST /banners/{id}/demote - Park an active banner.
async fn demote_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EngineSnapshot>> {
    Ok(Json(handle_demote(&state.engine, &id).await?))
}

/// POST /banners/refresh - Refetch from the remote store.
async fn refresh_handler(State(state): State<AppState>) -> Result<Json<RefreshResponse>> {
    Ok(Json(handle_refresh(&state.engine, state.store.as_ref()).await?))
}

/// GET /ws - Live snapshot and event stream.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let engine = state.engine.clone();
    let conn_manager = state.conn_manager.clone();
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, engine, conn_manager))
}
