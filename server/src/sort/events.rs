//! Engine notifications.
//!
//! Snapshots say what to render; events say what happened, so the UI layer
//! can show "saved" or "could not save, reverted" messages.

use serde::Serialize;

/// The kind of operation an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Reorder,
    Promote,
    Demote,
}

/// Something the engine did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// All writes of an operation succeeded.
    Committed {
        operation: OperationKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        item_id: Option<String>,
        writes: usize,
    },

    /// A write failed; the local ranking was reset to the last known-good state.
    RolledBack {
        operation: OperationKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        item_id: Option<String>,
        error: String,
    },

    /// The known-good state was replaced by a fresh listing.
    Reset { items: usize },

    /// The engine was torn down.
    Disposed,
}

impl EngineEvent {
    /// Check if this is a rollback.
    pub fn is_rollback(&self) -> bool {
        matches!(self, EngineEvent::RolledBack { .. })
    }
}
