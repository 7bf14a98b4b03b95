//! # Banner Engine
//!
//! The deterministic core of active-banner ranking.
//!
//! A small set of banners is "active" and ranked by an integer `sort_order`
//! that must always read `1..N`. This crate holds the pieces that keep it
//! that way while the UI reorders, promotes and demotes banners against a
//! remote store that only offers a single-item update.
//!
//! ## Design Principles
//!
//! - **No IO**: no network, no runtime, no real clock
//! - **Deterministic**: same inputs, same writes, same order
//! - **Injectable time**: deferred work goes through a [`Scheduler`]
//!
//! ## Core Concepts
//!
//! ### Items
//!
//! An [`Item`] is active (ranked `1..N`) or parked at [`PARKED_SORT_ORDER`].
//! A [`BannerSet`] holds all known items and derives the ranking from them,
//! breaking rank ties by creation time.
//!
//! ### Compaction
//!
//! The [`compactor`] module turns a change into [`RankWrite`]s:
//! - [`compactor::diff`] - permutation, writes only items whose rank moved
//! - [`compactor::plan_promotion`] - append at `N + 1`, capacity checked
//! - [`compactor::plan_demotion`] - park the item, shift the ones above it down
//!
//! ### Coordination
//!
//! - [`OperationLock`] admits one [`OperationState`] at a time, rejecting others
//! - [`ReorderCoalescer`] keeps only the latest proposed order of a drag and
//!   commits after [`REORDER_DEBOUNCE`] of quiet
//!
//! ## Quick Start
//!
//! ```rust
//! use banner_engine::{compactor, BannerSet, Item, Status};
//!
//! let set = BannerSet::from_items(vec![
//!     Item::active("a", 1, 1000),
//!     Item::active("b", 2, 2000),
//!     Item::active("c", 3, 3000),
//!     Item::parked("d", 4000),
//! ]);
//!
//! // Drag "c" to the top
//! let ranked = set.ranked();
//! let order = vec![ranked[2].clone(), ranked[0].clone(), ranked[1].clone()];
//! let writes = compactor::diff(&ranked, &order);
//! assert_eq!(writes.len(), 3);
//!
//! // Park "b": one write for "b", one to move "c" down
//! let writes = compactor::plan_demotion(&ranked, "b").unwrap();
//! assert_eq!(writes.len(), 2);
//! assert_eq!(writes[0].status, Status::Inactive);
//! ```

pub mod coalescer;
pub mod compactor;
pub mod error;
pub mod item;
pub mod lock;
pub mod scheduler;
pub mod set;
pub mod snapshot;

// Re-export main types at crate root
pub use coalescer::{
    Generation, PendingReorder, ReorderCoalescer, REORDER_DEBOUNCE, REORDER_DEBOUNCE_MS,
};
pub use compactor::RankWrite;
pub use error::Error;
pub use item::{Item, Status, PARKED_SORT_ORDER};
pub use lock::{OperationLock, OperationState};
pub use scheduler::{ManualScheduler, Scheduler, Task, TaskHandle};
pub use set::BannerSet;
pub use snapshot::{EngineSnapshot, SnapshotSummary};

/// Type aliases for clarity
pub type ItemId = String;
pub type SortOrder = i64;
pub type Timestamp = u64;

/// Default number of banners that may be active at once.
pub const DEFAULT_MAX_ACTIVE: usize = 3;
