//! Rank compaction.
//!
//! Pure functions that turn a ranking change (permutation, promotion or
//! demotion) into the smallest set of per-item writes that keeps the active
//! ranks a contiguous `1..N` sequence.
//!
//! # Write minimisation
//!
//! The remote store only offers a single-item update, so every write is a
//! network call. A permutation emits writes only for items whose rank really
//! changes: swapping two neighbours among five items costs two calls, not five.

use crate::{
    error::Result, Error, Item, ItemId, SortOrder, Status, PARKED_SORT_ORDER,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A single rank change to send to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankWrite {
    /// Target item
    pub id: ItemId,
    /// New `sort_order`
    pub sort_order: SortOrder,
    /// Status after the write
    pub status: Status,
}

impl RankWrite {
    /// Create a new write.
    pub fn new(id: impl Into<ItemId>, sort_order: SortOrder, status: Status) -> Self {
        Self {
            id: id.into(),
            sort_order,
            status,
        }
    }
}

/// Rank for the item at `index` in an ordering.
fn rank_at(index: usize) -> SortOrder {
    index as SortOrder + 1
}

/// Check that `new_order` is a permutation of the current active items.
pub fn validate_order(previous_active: &[Item], new_order: &[Item]) -> Result<()> {
    if previous_active.len() != new_order.len() {
        return Err(Error::InvalidOrder(format!(
            "expected {} items, got {}",
            previous_active.len(),
            new_order.len()
        )));
    }

    let known: HashSet<&str> = previous_active.iter().map(|i| i.id.as_str()).collect();
    let mut seen = HashSet::with_capacity(new_order.len());
    for item in new_order {
        if !known.contains(item.id.as_str()) {
            return Err(Error::InvalidOrder(format!("not an active item: {}", item.id)));
        }
        if !seen.insert(item.id.as_str()) {
            return Err(Error::InvalidOrder(format!("duplicate item: {}", item.id)));
        }
    }

    Ok(())
}

/// The ordering as it should look once committed: ranks `1..N`, all active.
pub fn renumber(order: &[Item]) -> Vec<Item> {
    order
        .iter()
        .enumerate()
        .map(|(i, item)| item.with_rank(rank_at(i), Status::Active))
        .collect()
}

/// Writes needed to move from `previous_active` to `new_order`.
///
/// `new_order[i]` gets rank `i + 1`. An item is written only if that differs
/// from its previous `sort_order`. Items missing from `previous_active` are
/// always written.
pub fn diff(previous_active: &[Item], new_order: &[Item]) -> Vec<RankWrite> {
    let previous: HashMap<&str, SortOrder> = previous_active
        .iter()
        .map(|i| (i.id.as_str(), i.sort_order))
        .collect();

    new_order
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let rank = rank_at(i);
            match previous.get(item.id.as_str()) {
                Some(&old) if old == rank => None,
                _ => Some(RankWrite::new(item.id.clone(), rank, Status::Active)),
            }
        })
        .collect()
}

/// Write that appends `item` to the end of the active ranking.
///
/// Fails with `CapacityExceeded` when `active` already holds `max_active`
/// items. No other item changes rank.
pub fn plan_promotion(active: &[Item], item: &Item, max_active: usize) -> Result<RankWrite> {
    if item.is_active() || active.iter().any(|a| a.id == item.id) {
        return Err(Error::AlreadyActive(item.id.clone()));
    }
    if active.len() >= max_active {
        return Err(Error::CapacityExceeded {
            active: active.len(),
            max: max_active,
        });
    }

    Ok(RankWrite::new(
        item.id.clone(),
        rank_at(active.len()),
        Status::Active,
    ))
}

/// Writes that park item `id` and close the gap it leaves.
///
/// The first write parks the target; every item ranked above it moves down by
/// exactly one. Produces `1 + (items ranked above the target)` writes.
///
/// Items sharing the target's `sort_order` keep it, so a duplicated rank
/// stays duplicated. [`diff`] repairs it on the next reorder commit.
pub fn plan_demotion(active: &[Item], id: &str) -> Result<Vec<RankWrite>> {
    let target = active
        .iter()
        .find(|i| i.id == id)
        .ok_or_else(|| Error::NotActive(id.to_string()))?;

    let mut writes = vec![RankWrite::new(
        target.id.clone(),
        PARKED_SORT_ORDER,
        Status::Inactive,
    )];

    let mut above: Vec<&Item> = active
        .iter()
        .filter(|i| i.id != target.id && i.sort_order > target.sort_order)
        .collect();
    above.sort_by(|a, b| a.rank_cmp(b));

    writes.extend(
        above
            .into_iter()
            .map(|i| RankWrite::new(i.id.clone(), i.sort_order - 1, Status::Active)),
    );

    Ok(writes)
}

/// Check that the ranks of `active` are exactly `1..N`, once each.
pub fn is_contiguous(active: &[Item]) -> bool {
    let mut ranks: Vec<SortOrder> = active.iter().map(|i| i.sort_order).collect();
    ranks.sort_unstable();
    ranks
        .iter()
        .enumerate()
        .all(|(i, &rank)| rank == rank_at(i))
}
