//! BannerSet - the collection of known banners.
//!
//! Holds every item (active and parked) keyed by ID. The active ranking is
//! derived on demand, never stored, so it cannot drift from the items.

use crate::{error::Result, Error, Item, ItemId, RankWrite};
use std::collections::BTreeMap;

/// All banners known to the engine.
///
/// Uses BTreeMap so iteration (and therefore every derived list) is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BannerSet {
    items: BTreeMap<ItemId, Item>,
}

impl BannerSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a remote listing. Later duplicates replace earlier ones.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut set = Self::new();
        for item in items {
            set.upsert(item);
        }
        set
    }

    /// Get an item by ID.
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    /// Insert or replace an item.
    pub fn upsert(&mut self, item: Item) {
        self.items.insert(item.id.clone(), item);
    }

    /// Active items in canonical rank order.
    pub fn ranked(&self) -> Vec<Item> {
        let mut active: Vec<Item> = self.items.values().filter(|i| i.is_active()).cloned().collect();
        active.sort_by(Item::rank_cmp);
        active
    }

    /// Inactive items, oldest first.
    pub fn parked(&self) -> Vec<Item> {
        let mut parked: Vec<Item> = self
            .items
            .values()
            .filter(|i| !i.is_active())
            .cloned()
            .collect();
        parked.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        parked
    }

    /// Count of active items.
    pub fn active_count(&self) -> usize {
        self.items.values().filter(|i| i.is_active()).count()
    }

    /// Total item count.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the set holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item bodies that a write plan would send, without changing the set.
    pub fn stage(&self, writes: &[RankWrite]) -> Result<Vec<Item>> {
        writes
            .iter()
            .map(|w| {
                self.get(&w.id)
                    .map(|item| item.with_rank(w.sort_order, w.status))
                    .ok_or_else(|| Error::ItemNotFound(w.id.clone()))
            })
            .collect()
    }

    /// Apply a write plan in place. Nothing changes if any ID is unknown.
    pub fn apply(&mut self, writes: &[RankWrite]) -> Result<()> {
        for item in self.stage(writes)? {
            self.upsert(item);
        }
        Ok(())
    }
}
