//! Engine to WebSocket fan-out.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::{ConnectionManager, ServerMessage};
use crate::sort::{BannerSortEngine, EngineEvent};

/// Push every snapshot change and engine event to all connections.
///
/// Stops once the engine is disposed or dropped.
pub fn spawn_relay(
    engine: &BannerSortEngine,
    conn_manager: Arc<ConnectionManager>,
) -> JoinHandle<()> {
    let mut snapshots = engine.subscribe();
    let mut events = engine.events();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = snapshots.borrow_and_update().clone();
                    conn_manager.broadcast_all(ServerMessage::snapshot(snapshot));
                }
                event = events.recv() => match event {
                    Ok(EngineEvent::Disposed) => {
                        conn_manager.broadcast_all(ServerMessage::event(EngineEvent::Disposed));
                        break;
                    }
                    Ok(event) => {
                        conn_manager.broadcast_all(ServerMessage::event(event));
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Relay lagged behind engine events");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        tracing::debug!("WebSocket relay stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryBannerStore;
    use crate::sort::EngineConfig;
    use banner_engine::{Item, ManualScheduler};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_relay_pushes_snapshots_and_events() {
        let items = vec![Item::active("a", 1, 0), Item::active("b", 2, 0)];
        let engine = BannerSortEngine::new(
            Arc::new(MemoryBannerStore::new(items.clone())),
            Arc::new(ManualScheduler::new()),
            EngineConfig::default(),
            items,
        );
        let manager = ConnectionManager::new_shared();
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.register(tx);

        let relay = spawn_relay(&engine, manager.clone());

        engine.reset(vec![Item::active("x", 1, 0)]).unwrap();

        let mut saw_snapshot = false;
        let mut saw_reset = false;
        while !(saw_snapshot && saw_reset) {
            match rx.recv().await.unwrap() {
                ServerMessage::Snapshot { snapshot } => {
                    assert_eq!(snapshot.ranked_ids(), vec!["x"]);
                    saw_snapshot = true;
                }
                ServerMessage::Event { event } => {
                    assert_eq!(event, EngineEvent::Reset { items: 1 });
                    saw_reset = true;
                }
                other => panic!("unexpected message: {other:?}"),
            }
        }

        engine.dispose();
        relay.await.unwrap();
    }
}
