//! BannerSortEngine - the coordinated ranking state machine.
//!
//! # States
//!
//! `Idle` is both the initial and the resting state. From there:
//!
//! - `propose_reorder` takes the lock as `Reordering`, shows the proposed order
//!   immediately and arms the coalescer. Further proposals replace it until
//!   the quiet period elapses or `flush_reorder` is called; then the diff is
//!   written and the lock is released.
//! - `promote` checks capacity, takes the lock as `Promoting` and writes one
//!   item. Nothing is shown until the store confirms.
//! - `demote` takes the lock as `Demoting`, shows the compacted ranking
//!   immediately and writes the target plus every shifted item.
//!
//! A request that finds the lock held is refused with `OperationConflict`.
//! Any failed write puts the last known-good ranking back on display.
//!
//! # Partial failure
//!
//! Writes are not transactional. When some writes of an operation land and
//! others fail, the local view is rolled back but the store keeps the writes
//! that landed. The engine emits [`EngineEvent::RolledBack`] and leaves
//! reconciliation to a refetch (see [`super::spawn_refresh_on_rollback`]).

use std::sync::{Arc, Weak};
use std::time::Duration;

use banner_engine::{
    compactor, error::Result, BannerSet, EngineSnapshot, Error, Generation, Item, ItemId,
    OperationLock, OperationState, ReorderCoalescer, Scheduler, DEFAULT_MAX_ACTIVE,
    REORDER_DEBOUNCE,
};
use futures::future::join_all;
use parking_lot::{Mutex, MutexGuard};
use tokio::sync::{broadcast, watch};

use super::events::{EngineEvent, OperationKind};
use crate::remote::RemoteBannerStore;

/// Buffered events per subscriber before the slowest one starts lagging.
const EVENT_CAPACITY: usize = 64;

/// Tunables for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of active banners
    pub max_active: usize,
    /// Quiet period before a proposed reorder is committed
    pub debounce: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_active: DEFAULT_MAX_ACTIVE,
            debounce: REORDER_DEBOUNCE,
        }
    }
}

/// Mutable state, guarded by one mutex and never held across an await.
struct Inner {
    /// Last state confirmed by the remote store
    confirmed: BannerSet,
    /// Displayed ranking (optimistic during reorder and demote)
    ranked: Vec<Item>,
    /// Displayed parked items
    parked: Vec<Item>,
    lock: OperationLock,
    coalescer: ReorderCoalescer,
    /// Reorder writes are in flight; proposals are refused
    committing: bool,
    /// A rollback left the store out of step with `confirmed` until the next reset
    stale: bool,
    disposed: bool,
}

impl Inner {
    fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot::new(
            self.ranked.clone(),
            self.parked.clone(),
            self.lock.state().clone(),
        )
    }

    fn check_live(&self) -> Result<()> {
        if self.disposed {
            return Err(Error::Disposed);
        }
        Ok(())
    }

    fn conflict(&self) -> Error {
        Error::OperationConflict {
            held: self.lock.state().clone(),
        }
    }

    /// Release the lock and display the confirmed state.
    fn settle(&mut self) {
        self.lock.release();
        self.committing = false;
        self.ranked = self.confirmed.ranked();
        self.parked = self.confirmed.parked();
    }
}

/// Coordinates reorder, promote and demote against the remote store.
///
/// Always used through `Arc`: the reorder timer holds a weak reference back
/// to the engine.
pub struct BannerSortEngine {
    store: Arc<dyn RemoteBannerStore>,
    config: EngineConfig,
    inner: Mutex<Inner>,
    snapshots: watch::Sender<EngineSnapshot>,
    events: broadcast::Sender<EngineEvent>,
    this: Weak<BannerSortEngine>,
}

impl BannerSortEngine {
    /// Create an engine over an initial remote listing.
    pub fn new(
        store: Arc<dyn RemoteBannerStore>,
        scheduler: Arc<dyn Scheduler>,
        config: EngineConfig,
        items: Vec<Item>,
    ) -> Arc<Self> {
        let confirmed = BannerSet::from_items(items);
        let inner = Inner {
            ranked: confirmed.ranked(),
            parked: confirmed.parked(),
            confirmed,
            lock: OperationLock::new(),
            coalescer: ReorderCoalescer::new(scheduler, config.debounce),
            committing: false,
            stale: false,
            disposed: false,
        };

        let (snapshots, _) = watch::channel(inner.snapshot());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Arc::new_cyclic(|this| Self {
            store,
            config,
            inner: Mutex::new(inner),
            snapshots,
            events,
            this: this.clone(),
        })
    }

    /// Current ranked list and operation state.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.inner.lock().snapshot()
    }

    /// Receive every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.snapshots.subscribe()
    }

    /// Receive commit, rollback and lifecycle events.
    pub fn events(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Check if an operation holds the lock.
    pub fn is_busy(&self) -> bool {
        self.inner.lock().lock.is_held()
    }

    /// Check if a rollback happened since the last reset.
    ///
    /// Ranks the store holds may differ from what the engine shows until the
    /// next [`BannerSortEngine::reset`].
    pub fn needs_refresh(&self) -> bool {
        self.inner.lock().stale
    }

    /// Resolve once no operation holds the lock.
    pub async fn wait_idle(&self) {
        let mut snapshots = self.snapshots.subscribe();
        let _ = snapshots.wait_for(|s| !s.is_busy()).await;
    }

    /// Show `order` immediately and commit it after the quiet period.
    ///
    /// Repeated calls during one gesture replace the pending order and restart
    /// the timer. Refused while any other operation, or a reorder commit, is
    /// in progress.
    pub fn propose_reorder(&self, order: Vec<Item>) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.check_live()?;

        let extending = inner.lock.state() == &OperationState::Reordering && !inner.committing;
        if !extending && inner.lock.is_held() {
            return Err(inner.conflict());
        }

        compactor::validate_order(&inner.confirmed.ranked(), &order)?;

        if !extending && !inner.lock.try_acquire(OperationState::Reordering) {
            return Err(inner.conflict());
        }

        inner.ranked = compactor::renumber(&order);

        let this = self.this.clone();
        let generation = inner.coalescer.propose(order, move |generation| {
            if let Some(engine) = this.upgrade() {
                engine.commit_due(generation);
            }
        });

        tracing::debug!(generation, extending, "Reorder proposed");
        self.publish(&inner);
        Ok(())
    }

    /// Commit the pending reorder now instead of waiting for the timer.
    ///
    /// Returns whether a commit was started. The writes are dispatched on the
    /// runtime; use [`BannerSortEngine::wait_idle`] or the event stream to
    /// observe the outcome.
    pub fn flush_reorder(&self) -> Result<bool> {
        let mut inner = self.inner.lock();
        inner.check_live()?;

        let pending = inner.coalescer.flush();
        match pending {
            Some(order) => {
                tracing::debug!("Reorder flushed");
                self.begin_commit(inner, order);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Append an inactive item to the end of the ranking.
    ///
    /// Capacity is checked before the lock, so a full ranking is refused
    /// without touching the store.
    pub async fn promote(&self, item: &Item) -> Result<Item> {
        let update = {
            let mut inner = self.inner.lock();
            inner.check_live()?;

            let candidate = inner
                .confirmed
                .get(&item.id)
                .cloned()
                .unwrap_or_else(|| item.clone());
            let write =
                compactor::plan_promotion(&inner.ranked, &candidate, self.config.max_active)?;

            if !inner
                .lock
                .try_acquire(OperationState::Promoting(candidate.id.clone()))
            {
                return Err(inner.conflict());
            }
            self.publish(&inner);

            candidate.with_rank(write.sort_order, write.status)
        };

        let id = update.id.clone();
        tracing::info!(id = %id, sort_order = update.sort_order, "Promoting banner");

        let stored = self
            .complete(OperationKind::Promote, Some(id.clone()), vec![update])
            .await?;
        stored.into_iter().next().ok_or(Error::ItemNotFound(id))
    }

    /// Park an active item and close the gap it leaves.
    pub async fn demote(&self, item: &Item) -> Result<()> {
        let updates = {
            let mut inner = self.inner.lock();
            inner.check_live()?;

            if inner.lock.is_held() {
                return Err(inner.conflict());
            }

            let target = inner
                .confirmed
                .get(&item.id)
                .ok_or_else(|| Error::ItemNotFound(item.id.clone()))?;
            if !target.is_active() {
                return Err(Error::NotActive(item.id.clone()));
            }

            let writes = compactor::plan_demotion(&inner.confirmed.ranked(), &item.id)?;
            let updates = inner.confirmed.stage(&writes)?;
            let mut preview = inner.confirmed.clone();
            preview.apply(&writes)?;

            if !inner
                .lock
                .try_acquire(OperationState::Demoting(item.id.clone()))
            {
                return Err(inner.conflict());
            }
            inner.ranked = preview.ranked();
            inner.parked = preview.parked();
            self.publish(&inner);

            updates
        };

        tracing::info!(id = %item.id, writes = updates.len(), "Demoting banner");

        self.complete(OperationKind::Demote, Some(item.id.clone()), updates)
            .await
            .map(|_| ())
    }

    /// Replace the known-good state with a fresh remote listing.
    pub fn reset(&self, items: Vec<Item>) -> Result<()> {
        let count = {
            let mut inner = self.inner.lock();
            inner.check_live()?;

            if inner.lock.is_held() {
                return Err(inner.conflict());
            }

            inner.confirmed = BannerSet::from_items(items);
            inner.stale = false;
            inner.settle();
            self.publish(&inner);
            inner.confirmed.len()
        };

        tracing::info!(items = count, "Banner state reset from remote");
        self.emit(EngineEvent::Reset { items: count });
        Ok(())
    }

    /// Tear down: drop any pending reorder without writing it.
    ///
    /// Writes already dispatched still complete and update the state. Every
    /// later call fails with `Disposed`.
    pub fn dispose(&self) {
        {
            let mut inner = self.inner.lock();
            if inner.disposed {
                return;
            }
            inner.disposed = true;

            if inner.coalescer.cancel() {
                tracing::debug!("Discarded pending reorder");
                inner.settle();
            }
            self.publish(&inner);
        }

        self.emit(EngineEvent::Disposed);
    }

    /// Timer callback: commit if `generation` is still the latest proposal.
    fn commit_due(&self, generation: Generation) {
        let mut inner = self.inner.lock();
        let Some(order) = inner.coalescer.take_due(generation) else {
            tracing::trace!(generation, "Stale reorder timer");
            return;
        };

        tracing::debug!(generation, "Reorder quiet period elapsed");
        self.begin_commit(inner, order);
    }

    /// Diff `order` against the confirmed ranking and dispatch the writes.
    ///
    /// After a rollback the confirmed ranks cannot be trusted as a base, so
    /// every rank of `order` is written until the next reset.
    fn begin_commit(&self, mut inner: MutexGuard<'_, Inner>, order: Vec<Item>) {
        let writes = if inner.stale {
            tracing::debug!("Confirmed ranks are stale, rewriting every rank");
            compactor::diff(&[], &order)
        } else {
            compactor::diff(&inner.confirmed.ranked(), &order)
        };

        if writes.is_empty() {
            inner.settle();
            self.publish(&inner);
            drop(inner);

            tracing::debug!("Reorder left every rank unchanged");
            self.emit(EngineEvent::Committed {
                operation: OperationKind::Reorder,
                item_id: None,
                writes: 0,
            });
            return;
        }

        let staged = inner.confirmed.stage(&writes);
        let updates = match staged {
            Ok(updates) => updates,
            Err(e) => {
                inner.settle();
                self.publish(&inner);
                drop(inner);

                tracing::warn!(error = %e, "Reorder no longer matches known banners");
                self.emit(EngineEvent::RolledBack {
                    operation: OperationKind::Reorder,
                    item_id: None,
                    error: e.to_string(),
                });
                return;
            }
        };

        inner.committing = true;
        self.publish(&inner);
        drop(inner);

        let Some(engine) = self.this.upgrade() else {
            return;
        };

        tracing::info!(writes = updates.len(), "Committing reorder");
        tokio::spawn(async move {
            let _ = engine
                .complete(OperationKind::Reorder, None, updates)
                .await;
        });
    }

    /// Write `updates`, then settle: keep them on success, roll back otherwise.
    async fn complete(
        &self,
        operation: OperationKind,
        item_id: Option<ItemId>,
        updates: Vec<Item>,
    ) -> Result<Vec<Item>> {
        let result = self.write_all(updates).await;

        let event = {
            let mut inner = self.inner.lock();
            let event = match &result {
                Ok(stored) => {
                    for item in stored {
                        inner.confirmed.upsert(item.clone());
                    }
                    EngineEvent::Committed {
                        operation,
                        item_id,
                        writes: stored.len(),
                    }
                }
                Err(e) => {
                    inner.stale = true;
                    EngineEvent::RolledBack {
                        operation,
                        item_id,
                        error: e.to_string(),
                    }
                }
            };

            inner.settle();
            if !compactor::is_contiguous(&inner.ranked) {
                tracing::warn!(?operation, "Active ranks are not contiguous");
            }
            self.publish(&inner);
            event
        };

        match &event {
            EngineEvent::RolledBack { error, .. } => {
                tracing::warn!(?operation, error = %error, "Rolled back to last known-good ranking");
            }
            _ => tracing::info!(?operation, "Operation committed"),
        }
        self.emit(event);

        result
    }

    /// Send every update concurrently and wait for all of them.
    async fn write_all(&self, updates: Vec<Item>) -> Result<Vec<Item>> {
        let attempted = updates.len();
        let results = join_all(
            updates
                .into_iter()
                .map(|item| self.store.update_banner(item)),
        )
        .await;

        let mut stored = Vec::with_capacity(attempted);
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(item) => stored.push(item),
                Err(e) => failures.push(e),
            }
        }

        if failures.is_empty() {
            return Ok(stored);
        }

        tracing::warn!(
            failed = failures.len(),
            landed = stored.len(),
            attempted,
            "Remote writes failed"
        );
        Err(Error::RemoteWriteFailure {
            failed: failures.len(),
            attempted,
            reason: failures[0].to_string(),
        })
    }

    fn publish(&self, inner: &Inner) {
        self.snapshots.send_replace(inner.snapshot());
    }

    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Drop for BannerSortEngine {
    fn drop(&mut self) {
        self.inner.get_mut().coalescer.cancel();
    }
}
