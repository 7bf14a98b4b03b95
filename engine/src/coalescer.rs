//! Drag-gesture coalescing.
//!
//! A drag produces a burst of proposed orderings. The coalescer keeps only the
//! latest one and commits it after a quiet period, restarting the timer on
//! every proposal (debounce-with-replace). `flush` skips the wait, `cancel`
//! drops the proposal without committing.
//!
//! The coalescer does not decide whether a proposal is allowed; the engine's
//! operation lock does that before calling [`ReorderCoalescer::propose`].

use crate::scheduler::{Scheduler, TaskHandle};
use crate::Item;
use std::sync::Arc;
use std::time::Duration;

/// Quiet period before a proposed order is committed.
pub const REORDER_DEBOUNCE_MS: u64 = 500;

/// [`REORDER_DEBOUNCE_MS`] as a `Duration`.
pub const REORDER_DEBOUNCE: Duration = Duration::from_millis(REORDER_DEBOUNCE_MS);

/// Identifies one armed timer. A timer that fires with a stale generation
/// (replaced or cancelled in the meantime) is ignored.
pub type Generation = u64;

/// The latest proposed ordering and its commit timer.
#[derive(Debug)]
pub struct PendingReorder {
    /// Full proposed ordering of active items
    pub order: Vec<Item>,
    /// Timer that will deliver this generation
    pub generation: Generation,
    timer: TaskHandle,
}

/// Debounce-with-replace buffer for reorder proposals.
pub struct ReorderCoalescer {
    scheduler: Arc<dyn Scheduler>,
    delay: Duration,
    generation: Generation,
    pending: Option<PendingReorder>,
}

impl ReorderCoalescer {
    /// Create a coalescer with the given quiet period.
    pub fn new(scheduler: Arc<dyn Scheduler>, delay: Duration) -> Self {
        Self {
            scheduler,
            delay,
            generation: 0,
            pending: None,
        }
    }

    /// Create a coalescer with the default [`REORDER_DEBOUNCE`].
    pub fn with_default_delay(scheduler: Arc<dyn Scheduler>) -> Self {
        Self::new(scheduler, REORDER_DEBOUNCE)
    }

    /// Store `order` as the latest proposal and (re)start the timer.
    ///
    /// Any previous timer is cancelled. When the quiet period elapses,
    /// `on_quiet` is called with the generation to hand back to
    /// [`ReorderCoalescer::take_due`].
    pub fn propose<F>(&mut self, order: Vec<Item>, on_quiet: F) -> Generation
    where
        F: FnOnce(Generation) + Send + 'static,
    {
        if let Some(previous) = self.pending.take() {
            previous.timer.cancel();
        }

        self.generation += 1;
        let generation = self.generation;
        let timer = self
            .scheduler
            .schedule(self.delay, Box::new(move || on_quiet(generation)));

        self.pending = Some(PendingReorder {
            order,
            generation,
            timer,
        });
        generation
    }

    /// Take the pending order if `generation` is still the latest proposal.
    ///
    /// Called from the timer callback; the timer has already fired so it is
    /// not cancelled.
    pub fn take_due(&mut self, generation: Generation) -> Option<Vec<Item>> {
        let current = self
            .pending
            .as_ref()
            .is_some_and(|p| p.generation == generation);
        if current {
            self.pending.take().map(|p| p.order)
        } else {
            None
        }
    }

    /// Cancel the timer and return the latest proposal for immediate commit.
    pub fn flush(&mut self) -> Option<Vec<Item>> {
        self.pending.take().map(|pending| {
            pending.timer.cancel();
            pending.order
        })
    }

    /// Drop the latest proposal and its timer. Returns whether one existed.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.timer.cancel();
                true
            }
            None => false,
        }
    }

    /// The latest proposed order, if any.
    pub fn latest(&self) -> Option<&[Item]> {
        self.pending.as_ref().map(|p| p.order.as_slice())
    }

    /// Check if a proposal is waiting for its quiet period.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl std::fmt::Debug for ReorderCoalescer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReorderCoalescer")
            .field("delay", &self.delay)
            .field("generation", &self.generation)
            .field("pending", &self.pending)
            .finish()
    }
}
