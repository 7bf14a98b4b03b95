//! Banner items and their ranking fields.

use crate::{ItemId, SortOrder, Timestamp};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Rank carried by every inactive item. Never part of the active `1..N` sequence.
pub const PARKED_SORT_ORDER: SortOrder = 0;

/// Whether an item takes part in the active ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Eligible for display, ranked by `sort_order`
    Active,
    /// Parked outside the ranking
    Inactive,
}

/// A banner as stored by the remote store.
///
/// Fields the engine does not interpret are kept in `fields` and sent back
/// untouched on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier
    pub id: ItemId,
    /// Position in the active ranking (1-based), or [`PARKED_SORT_ORDER`]
    pub sort_order: SortOrder,
    /// Active or inactive
    pub status: Status,
    /// Creation time (milliseconds since epoch), used to break rank ties
    pub created_at: Timestamp,
    /// Remaining remote fields (title, image, link, ...)
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Item {
    /// Create an item with no extra fields.
    pub fn new(
        id: impl Into<ItemId>,
        sort_order: SortOrder,
        status: Status,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            sort_order,
            status,
            created_at,
            fields: serde_json::Map::new(),
        }
    }

    /// Create an active item at the given rank.
    pub fn active(id: impl Into<ItemId>, sort_order: SortOrder, created_at: Timestamp) -> Self {
        Self::new(id, sort_order, Status::Active, created_at)
    }

    /// Create a parked (inactive) item.
    pub fn parked(id: impl Into<ItemId>, created_at: Timestamp) -> Self {
        Self::new(id, PARKED_SORT_ORDER, Status::Inactive, created_at)
    }

    /// Attach an extra remote field.
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Check if the item is part of the active ranking.
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// Copy of this item with a new rank and status, all other fields unchanged.
    pub fn with_rank(&self, sort_order: SortOrder, status: Status) -> Self {
        Self {
            sort_order,
            status,
            ..self.clone()
        }
    }

    /// Canonical ranking order: `sort_order`, then `created_at`, then `id`.
    ///
    /// Equal `sort_order` values only show up transiently (external writes);
    /// the earlier-created item ranks first.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.sort_order
            .cmp(&other.sort_order)
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| self.id.cmp(&other.id))
    }
}
