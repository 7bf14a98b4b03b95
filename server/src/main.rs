//! Banner Server - ordering service for the active banner list.
//!
//! Serves HTTP and WebSocket endpoints over a [`sort::BannerSortEngine`]: reorders
//! are shown immediately and coalesced into one commit per gesture, promotions
//! and demotions are serialized behind a single operation lock, and every
//! change is written through the remote banner API one item at a time.

mod config;
mod error;
mod handlers;
mod remote;
mod routes;
mod sort;
mod websocket;

use crate::config::Config;
use crate::remote::{HttpBannerStore, RemoteBannerStore};
use crate::sort::{BannerSortEngine, TokioScheduler};
use crate::websocket::ConnectionManager;
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BannerSortEngine>,
    pub store: Arc<dyn RemoteBannerStore>,
    pub config: Arc<Config>,
    pub conn_manager: Arc<ConnectionManager>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "banner_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Banner Server on {}:{}", config.host, config.port);

    // Initial listing from the remote store
    let store: Arc<dyn RemoteBannerStore> = Arc::new(HttpBannerStore::from_config(&config)?);
    let items = store.list_banners().await?;
    tracing::info!(
        items = items.len(),
        remote = %config.banner_api_url,
        "Loaded banners from remote store"
    );

    let engine = BannerSortEngine::new(
        store.clone(),
        Arc::new(TokioScheduler::current()),
        config.engine(),
        items,
    );

    // Background tasks
    let conn_manager = ConnectionManager::new_shared();
    let relay = websocket::spawn_relay(&engine, conn_manager.clone());
    let refresher = sort::spawn_refresh_on_rollback(engine.clone(), store.clone());

    // Build application state
    let state = AppState {
        engine: engine.clone(),
        store,
        config: Arc::new(config.clone()),
        conn_manager,
    };

    // Build router
    let app = Router::new()
        .merge(routes::create_routes())
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drop any uncommitted gesture; writes already in flight still finish
    engine.dispose();
    engine.wait_idle().await;
    let _ = tokio::join!(relay, refresher);

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
