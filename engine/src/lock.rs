//! Mutual exclusion for ranking operations.
//!
//! Reorder, promote and demote all rewrite the same ranked list, so only one of
//! them may be in progress at a time. The lock never queues: a second request
//! is refused immediately and the caller reports "operation in progress".

use crate::ItemId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the engine is currently doing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "itemId", rename_all = "camelCase")]
pub enum OperationState {
    /// Resting state, nothing in progress
    #[default]
    Idle,
    /// A drag gesture is being coalesced or committed
    Reordering,
    /// An inactive item is being appended to the ranking
    Promoting(ItemId),
    /// An active item is being parked
    Demoting(ItemId),
}

impl OperationState {
    /// Check if no operation is in progress.
    pub fn is_idle(&self) -> bool {
        matches!(self, OperationState::Idle)
    }

    /// The item targeted by a promote or demote.
    pub fn item_id(&self) -> Option<&ItemId> {
        match self {
            OperationState::Promoting(id) | OperationState::Demoting(id) => Some(id),
            OperationState::Idle | OperationState::Reordering => None,
        }
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationState::Idle => f.write_str("idle"),
            OperationState::Reordering => f.write_str("reordering"),
            OperationState::Promoting(id) => write!(f, "promoting {id}"),
            OperationState::Demoting(id) => write!(f, "demoting {id}"),
        }
    }
}

/// Single-holder, reject-on-conflict lock over the ranked list.
#[derive(Debug, Clone, Default)]
pub struct OperationLock {
    state: OperationState,
}

impl OperationLock {
    /// Create an unheld lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to enter `operation`.
    ///
    /// Returns `false` without changing anything if another operation holds
    /// the lock. `Idle` is never granted.
    pub fn try_acquire(&mut self, operation: OperationState) -> bool {
        if !self.state.is_idle() || operation.is_idle() {
            return false;
        }
        self.state = operation;
        true
    }

    /// Return to `Idle`.
    pub fn release(&mut self) {
        self.state = OperationState::Idle;
    }

    /// The operation currently holding the lock.
    pub fn state(&self) -> &OperationState {
        &self.state
    }

    /// Check if any operation holds the lock.
    pub fn is_held(&self) -> bool {
        !self.state.is_idle()
    }
}
