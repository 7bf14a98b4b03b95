//! Banner ranking request handlers.
//!
//! Shared by the HTTP routes and the WebSocket dispatcher. Clients address
//! banners by id; these resolve ids against the current snapshot before
//! handing full items to the engine.

use banner_engine::{EngineSnapshot, Error, Item};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::remote::RemoteBannerStore;
use crate::sort::{self, BannerSortEngine};

/// Body of `PUT /banners/order`.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    /// Active banner ids, first is rank 1
    pub order: Vec<String>,
}

/// Response of `POST /banners/order/flush`.
#[derive(Debug, Serialize)]
pub struct FlushResponse {
    /// Whether a pending reorder was committed
    pub flushed: bool,
}

/// Response of `POST /banners/refresh`.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// Banners known after the refetch
    pub items: usize,
}

/// Look up a banner, active or parked.
fn resolve(snapshot: &EngineSnapshot, id: &str) -> Result<Item> {
    snapshot
        .find(id)
        .cloned()
        .ok_or_else(|| AppError::from(Error::ItemNotFound(id.to_string())))
}

/// Turn an id list into items, in the given order.
fn resolve_order(snapshot: &EngineSnapshot, ids: &[String]) -> Result<Vec<Item>> {
    ids.iter()
        .map(|id| {
            snapshot
                .find(id)
                .cloned()
                .ok_or_else(|| {
                    AppError::from(Error::InvalidOrder(format!("unknown banner {id}")))
                })
        })
        .collect()
}

/// Propose a reorder; returns the optimistic snapshot.
pub fn handle_reorder(
    engine: &BannerSortEngine,
    request: ReorderRequest,
) -> Result<EngineSnapshot> {
    let order = resolve_order(&engine.snapshot(), &request.order)?;
    engine.propose_reorder(order)?;

    tracing::debug!(items = request.order.len(), "Reorder accepted");
    Ok(engine.snapshot())
}

/// Commit the pending reorder immediately.
pub fn handle_flush(engine: &BannerSortEngine) -> Result<FlushResponse> {
    let flushed = engine.flush_reorder()?;
    Ok(FlushResponse { flushed })
}

/// Promote a parked banner; returns it as stored remotely.
pub async fn handle_promote(engine: &BannerSortEngine, id: &str) -> Result<Item> {
    let item = resolve(&engine.snapshot(), id)?;
    Ok(engine.promote(&item).await?)
}

/// Demote an active banner; returns the resulting snapshot.
pub async fn handle_demote(engine: &BannerSortEngine, id: &str) -> Result<EngineSnapshot> {
    let item = resolve(&engine.snapshot(), id)?;
    engine.demote(&item).await?;
    Ok(engine.snapshot())
}

/// Refetch every banner from the remote store.
pub async fn handle_refresh(
    engine: &BannerSortEngine,
    store: &dyn RemoteBannerStore,
) -> Result<RefreshResponse> {
    let items = sort::refresh(engine, store).await?;
    Ok(RefreshResponse { items })
}
