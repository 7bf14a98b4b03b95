//! Edge case tests for banner-engine
//!
//! These tests cover boundary conditions and unusual inputs.

use banner_engine::{
    compactor, BannerSet, Error, Item, ManualScheduler, OperationLock, OperationState,
    ReorderCoalescer, Status, PARKED_SORT_ORDER,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn active_set(n: usize) -> BannerSet {
    BannerSet::from_items(
        (0..n).map(|i| Item::active(format!("b{i}"), i as i64 + 1, 1000 + i as u64)),
    )
}

// ============================================================================
// Empty and single-item sets
// ============================================================================

#[test]
fn empty_set_has_empty_ranking() {
    let set = BannerSet::new();
    assert!(set.is_empty());
    assert!(set.ranked().is_empty());
    assert!(compactor::diff(&[], &[]).is_empty());
    assert!(compactor::validate_order(&[], &[]).is_ok());
}

#[test]
fn promote_into_empty_ranking_gets_rank_one() {
    let write = compactor::plan_promotion(&[], &Item::parked("p", 1), 3).unwrap();
    assert_eq!(write.sort_order, 1);
    assert_eq!(write.status, Status::Active);
}

#[test]
fn zero_capacity_rejects_everything() {
    let result = compactor::plan_promotion(&[], &Item::parked("p", 1), 0);
    assert_eq!(result, Err(Error::CapacityExceeded { active: 0, max: 0 }));
}

#[test]
fn demote_only_item() {
    let set = active_set(1);
    let writes = compactor::plan_demotion(&set.ranked(), "b0").unwrap();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].sort_order, PARKED_SORT_ORDER);
}

// ============================================================================
// Data from concurrent external writes
// ============================================================================

#[test]
fn duplicate_ranks_resolve_by_creation_time() {
    let set = BannerSet::from_items(vec![
        Item::active("newer", 1, 2000),
        Item::active("older", 1, 1000),
        Item::active("third", 2, 500),
    ]);

    let ranked = set.ranked();
    let ids: Vec<_> = ranked.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["older", "newer", "third"]);
    assert!(!compactor::is_contiguous(&ranked));

    // Committing the displayed order repairs the ranks
    let writes = compactor::diff(&ranked, &ranked);
    let ids: Vec<_> = writes.iter().map(|w| w.id.as_str()).collect();
    assert_eq!(ids, vec!["newer", "third"]);

    let mut repaired = set.clone();
    repaired.apply(&writes).unwrap();
    assert!(compactor::is_contiguous(&repaired.ranked()));
}

#[test]
fn sparse_ranks_demotion_only_shifts_higher() {
    let set = BannerSet::from_items(vec![
        Item::active("a", 1, 0),
        Item::active("b", 4, 0),
        Item::active("c", 9, 0),
    ]);

    let writes = compactor::plan_demotion(&set.ranked(), "b").unwrap();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[1].id, "c");
    assert_eq!(writes[1].sort_order, 8);
}

#[test]
fn remote_listing_with_duplicate_ids_keeps_last() {
    let set = BannerSet::from_items(vec![Item::active("a", 1, 0), Item::parked("a", 0)]);
    assert_eq!(set.len(), 1);
    assert_eq!(set.active_count(), 0);
}

// ============================================================================
// Payload preservation
// ============================================================================

#[test]
fn staged_writes_keep_unrelated_fields() {
    let set = BannerSet::from_items(vec![
        Item::active("a", 1, 0).with_field("title", json!("Summer")),
        Item::active("b", 2, 0).with_field("link", json!({"href": "/sale", "target": "_blank"})),
    ]);

    let ranked = set.ranked();
    let order = vec![ranked[1].clone(), ranked[0].clone()];
    let staged = set.stage(&compactor::diff(&ranked, &order)).unwrap();

    assert_eq!(staged.len(), 2);
    assert_eq!(staged[0].fields["link"]["href"], json!("/sale"));
    assert_eq!(staged[1].fields["title"], json!("Summer"));
}

#[test]
fn unicode_ids() {
    let set = BannerSet::from_items(vec![
        Item::active("日本語", 1, 0),
        Item::active("🎉", 2, 0),
    ]);
    let ranked = set.ranked();
    let order = vec![ranked[1].clone(), ranked[0].clone()];
    assert!(compactor::validate_order(&ranked, &order).is_ok());
    assert_eq!(compactor::diff(&ranked, &order).len(), 2);
}

// ============================================================================
// Lock and coalescer together
// ============================================================================

#[test]
fn lock_holds_across_many_proposals() {
    let scheduler = ManualScheduler::new();
    let mut lock = OperationLock::new();
    let mut coalescer =
        ReorderCoalescer::new(Arc::new(scheduler.clone()), Duration::from_millis(500));
    let set = active_set(3);

    assert!(lock.try_acquire(OperationState::Reordering));
    for _ in 0..50 {
        coalescer.propose(set.ranked(), |_| {});
        scheduler.advance_ms(100);
    }
    assert_eq!(scheduler.pending(), 1);

    // A promote arriving mid-gesture is refused
    assert!(!lock.try_acquire(OperationState::Promoting("p".into())));
    assert_eq!(lock.state(), &OperationState::Reordering);

    assert!(coalescer.flush().is_some());
    lock.release();
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn large_ranking() {
    let set = active_set(10_000);
    let mut order = set.ranked();
    order.reverse();

    let writes = compactor::diff(&set.ranked(), &order);
    // Even length: no item keeps its rank
    assert_eq!(writes.len(), 10_000);

    let mut applied = set.clone();
    applied.apply(&writes).unwrap();
    assert!(compactor::is_contiguous(&applied.ranked()));
    assert_eq!(applied.ranked()[0].id, "b9999");
}
