//! Banner ranking orchestration.
//!
//! [`BannerSortEngine`] ties the engine crate's lock, coalescer and compactor
//! to the remote store: optimistic local ordering, one write per changed rank,
//! full rollback on failure.

mod engine;
mod events;
mod refresh;
mod scheduler;

pub use engine::{BannerSortEngine, EngineConfig};
pub use events::{EngineEvent, OperationKind};
pub use refresh::{refresh, spawn_refresh_on_rollback};
pub use scheduler::TokioScheduler;
