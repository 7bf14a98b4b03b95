//! Reconciliation after partial failure.
//!
//! A rollback restores the local view but not the store, where some writes
//! may have landed. Refetching the full listing makes the store the source of
//! truth again.

use std::sync::Arc;

use banner_engine::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::{BannerSortEngine, EngineEvent};
use crate::error::AppError;
use crate::remote::RemoteBannerStore;

/// Relist every banner and reset the engine to it. Returns the item count.
pub async fn refresh(
    engine: &BannerSortEngine,
    store: &dyn RemoteBannerStore,
) -> Result<usize, AppError> {
    let items = store.list_banners().await?;
    let count = items.len();
    engine.reset(items)?;
    Ok(count)
}

/// Refetch once no operation holds the lock.
///
/// A listing taken while an operation was running could predate its writes,
/// so a reset refused with `OperationConflict` is retried from the listing.
pub async fn refresh_when_idle(
    engine: &BannerSortEngine,
    store: &dyn RemoteBannerStore,
) -> Result<usize, AppError> {
    loop {
        engine.wait_idle().await;
        match refresh(engine, store).await {
            Err(AppError::Engine(Error::OperationConflict { held })) => {
                tracing::debug!(%held, "Refetch raced an operation, retrying");
            }
            result => return result,
        }
    }
}

/// Refetch after every rollback until the engine is disposed.
pub fn spawn_refresh_on_rollback(
    engine: Arc<BannerSortEngine>,
    store: Arc<dyn RemoteBannerStore>,
) -> JoinHandle<()> {
    let mut events = engine.events();

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) if event.is_rollback() => {
                    match refresh_when_idle(&engine, store.as_ref()).await {
                        Ok(count) => tracing::info!(items = count, "Refetched after rollback"),
                        Err(e) => tracing::warn!(error = %e, "Refetch after rollback failed"),
                    }
                }
                Ok(EngineEvent::Disposed) | Err(RecvError::Closed) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event stream lagged, refetching");
                    if let Err(e) = refresh_when_idle(&engine, store.as_ref()).await {
                        tracing::warn!(error = %e, "Refetch after lag failed");
                    }
                }
            }
        }
        tracing::debug!("Rollback refresher stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryBannerStore;
    use crate::sort::EngineConfig;
    use banner_engine::{Item, ManualScheduler};

    fn setup() -> (Arc<BannerSortEngine>, Arc<MemoryBannerStore>) {
        let items = vec![
            Item::active("a", 1, 100),
            Item::active("b", 2, 200),
            Item::active("c", 3, 300),
        ];
        let store = Arc::new(MemoryBannerStore::new(items.clone()));
        let engine = BannerSortEngine::new(
            store.clone(),
            Arc::new(ManualScheduler::new()),
            EngineConfig::default(),
            items,
        );
        (engine, store)
    }

    #[tokio::test]
    async fn refresh_adopts_remote_state() {
        let (engine, store) = setup();
        store.fail_writes_for("a");

        let snapshot = engine.snapshot();
        let order = ["c", "a", "b"]
            .iter()
            .map(|id| snapshot.find(id).unwrap().clone())
            .collect();
        engine.propose_reorder(order).unwrap();
        engine.flush_reorder().unwrap();
        engine.wait_idle().await;

        // Rolled back locally, but "c" and "b" landed remotely
        assert_eq!(engine.snapshot().ranked_ids(), vec!["a", "b", "c"]);

        let count = refresh(&engine, store.as_ref()).await.unwrap();
        assert_eq!(count, 3);

        let ranked = engine.snapshot().ranked_items;
        let c = ranked.iter().find(|i| i.id == "c").unwrap();
        assert_eq!(c.sort_order, 1);
    }

    #[tokio::test]
    async fn refresher_runs_after_rollback_and_stops_on_dispose() {
        let (engine, store) = setup();
        let handle = spawn_refresh_on_rollback(engine.clone(), store.clone());
        let mut events = engine.events();
        store.fail_writes_for("c");

        let b = engine.snapshot().find("b").unwrap().clone();
        assert!(engine.demote(&b).await.is_err());

        // Rollback, then the reset triggered by the refresher
        assert!(events.recv().await.unwrap().is_rollback());
        assert_eq!(events.recv().await.unwrap(), EngineEvent::Reset { items: 3 });

        // "b" was parked remotely even though "c" failed
        assert!(engine.snapshot().parked_items.iter().any(|i| i.id == "b"));

        engine.dispose();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn refresher_retries_after_a_racing_gesture() {
        let (engine, store) = setup();
        let handle = spawn_refresh_on_rollback(engine.clone(), store.clone());
        let mut events = engine.events();
        store.fail_writes_for("c");

        // "b" lands parked remotely, "c" keeps rank 3: rolled back locally
        let b = engine.snapshot().find("b").unwrap().clone();
        assert!(engine.demote(&b).await.is_err());

        // A gesture starts before the refresher gets to reset
        let snapshot = engine.snapshot();
        let order = ["c", "a", "b"]
            .iter()
            .map(|id| snapshot.find(id).unwrap().clone())
            .collect();
        engine.propose_reorder(order).unwrap();
        tokio::task::yield_now().await;
        assert!(engine.is_busy());

        store.clear_failures();
        engine.flush_reorder().unwrap();

        loop {
            if let EngineEvent::Reset { .. } = events.recv().await.unwrap() {
                break;
            }
        }

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.ranked_ids(), vec!["c", "a", "b"]);
        assert!(banner_engine::compactor::is_contiguous(&snapshot.ranked_items));
        assert!(!engine.needs_refresh());
        assert_eq!(store.get("b").unwrap().sort_order, 3);

        engine.dispose();
        handle.await.unwrap();
    }
}
