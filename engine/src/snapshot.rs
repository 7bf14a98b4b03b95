//! Observable engine state.
//!
//! Snapshots are what the UI renders: the ranked list it should display and
//! whether an operation is running. They are plain values, cloned out of the
//! engine and pushed to subscribers on every change.

use crate::{compactor, Item, OperationState};
use serde::{Deserialize, Serialize};

/// A point-in-time view of the ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    /// Active items in display order (may be optimistic while reordering)
    pub ranked_items: Vec<Item>,
    /// Inactive items, oldest first
    pub parked_items: Vec<Item>,
    /// Operation currently holding the lock
    pub state: OperationState,
}

impl EngineSnapshot {
    /// Build a snapshot.
    pub fn new(ranked_items: Vec<Item>, parked_items: Vec<Item>, state: OperationState) -> Self {
        Self {
            ranked_items,
            parked_items,
            state,
        }
    }

    /// Check if an operation is running.
    pub fn is_busy(&self) -> bool {
        !self.state.is_idle()
    }

    /// IDs of the ranked items, in order.
    pub fn ranked_ids(&self) -> Vec<&str> {
        self.ranked_items.iter().map(|i| i.id.as_str()).collect()
    }

    /// Find a ranked or parked item.
    pub fn find(&self, id: &str) -> Option<&Item> {
        self.ranked_items
            .iter()
            .chain(self.parked_items.iter())
            .find(|i| i.id == id)
    }
}

/// Counts and health of a snapshot (without the item bodies).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    /// Active item count
    pub active_count: usize,
    /// Inactive item count
    pub parked_count: usize,
    /// Operation holding the lock
    pub state: OperationState,
    /// Whether active ranks form `1..N`
    pub contiguous: bool,
}

impl From<&EngineSnapshot> for SnapshotSummary {
    fn from(snapshot: &EngineSnapshot) -> Self {
        Self {
            active_count: snapshot.ranked_items.len(),
            parked_count: snapshot.parked_items.len(),
            state: snapshot.state.clone(),
            contiguous: compactor::is_contiguous(&snapshot.ranked_items),
        }
    }
}
