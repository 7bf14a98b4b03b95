//! Error types for the banner engine.

use crate::{ItemId, OperationState};
use thiserror::Error;

/// All possible errors from ranking operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Rejected before touching the remote store
    #[error("active limit reached: {active} of {max} banners are active")]
    CapacityExceeded { active: usize, max: usize },

    #[error("operation in progress: {held}")]
    OperationConflict { held: OperationState },

    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("item is already active: {0}")]
    AlreadyActive(ItemId),

    #[error("item is not active: {0}")]
    NotActive(ItemId),

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    // Remote failures
    #[error("remote write failed ({failed} of {attempted}): {reason}")]
    RemoteWriteFailure {
        failed: usize,
        attempted: usize,
        reason: String,
    },

    // Lifecycle
    #[error("engine has been disposed")]
    Disposed,
}

impl Error {
    /// Whether the request was refused without any remote call.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Error::RemoteWriteFailure { .. })
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
