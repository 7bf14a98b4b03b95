//! Property tests for rank compaction.
//!
//! Every reachable ranking must stay contiguous, and permutation diffs must
//! touch exactly the items whose rank moved.

use banner_engine::{compactor, BannerSet, Item, Status, PARKED_SORT_ORDER};
use proptest::prelude::*;

fn contiguous_set(n: usize) -> BannerSet {
    BannerSet::from_items((0..n).map(|i| Item::active(format!("b{i:03}"), i as i64 + 1, i as u64)))
}

/// A contiguous ranking of 1..=12 items plus a shuffled copy of it.
fn ranking_and_permutation() -> impl Strategy<Value = (Vec<Item>, Vec<Item>)> {
    (1usize..=12).prop_flat_map(|n| {
        let ranked = contiguous_set(n).ranked();
        (Just(ranked.clone()), Just(ranked).prop_shuffle())
    })
}

proptest! {
    #[test]
    fn diff_then_apply_is_contiguous((ranked, order) in ranking_and_permutation()) {
        let mut set = BannerSet::from_items(ranked.clone());
        set.apply(&compactor::diff(&ranked, &order)).unwrap();

        let after = set.ranked();
        prop_assert!(compactor::is_contiguous(&after));
        let ids: Vec<_> = after.iter().map(|i| i.id.clone()).collect();
        let expected: Vec<_> = order.iter().map(|i| i.id.clone()).collect();
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn diff_is_minimal((ranked, order) in ranking_and_permutation()) {
        let writes = compactor::diff(&ranked, &order);
        let moved = order
            .iter()
            .enumerate()
            .filter(|(i, item)| item.sort_order != *i as i64 + 1)
            .count();
        prop_assert_eq!(writes.len(), moved);
        prop_assert!(writes.iter().all(|w| w.status == Status::Active));
    }

    #[test]
    fn demotion_keeps_contiguity(n in 1usize..=12, pick in 0usize..12) {
        let mut set = contiguous_set(n);
        let ranked = set.ranked();
        let target = ranked[pick % n].clone();

        let writes = compactor::plan_demotion(&ranked, &target.id).unwrap();
        prop_assert_eq!(writes.len(), 1 + (n - target.sort_order as usize));

        set.apply(&writes).unwrap();
        prop_assert!(compactor::is_contiguous(&set.ranked()));
        let parked = set.get(&target.id).unwrap();
        prop_assert_eq!(parked.sort_order, PARKED_SORT_ORDER);
        prop_assert!(!parked.is_active());
    }

    #[test]
    fn promotion_keeps_contiguity(n in 0usize..=5, max in 0usize..=5) {
        let mut set = contiguous_set(n);
        set.upsert(Item::parked("new", 10_000));
        let ranked = set.ranked();
        let candidate = set.get("new").unwrap().clone();

        match compactor::plan_promotion(&ranked, &candidate, max) {
            Ok(write) => {
                prop_assert!(n < max);
                set.apply(&[write]).unwrap();
                prop_assert!(compactor::is_contiguous(&set.ranked()));
                let ranked_after = set.ranked();
                prop_assert_eq!(ranked_after.last().unwrap().id.as_str(), "new");
            }
            Err(_) => prop_assert!(n >= max),
        }
    }
}
