//! Integration tests: multiset semantics and buffer reclamation of bags
//! sharing the calling thread's arena.

use satchel_arena::{Bag, SharedStorage, SlotIndex};
use satchel_test_utils::{assert_same_multiset, sorted, Tracker};

fn thread_arena() -> SharedStorage<u32> {
    SharedStorage::for_current_thread()
}

// ── Single bag ───────────────────────────────────────────────────────

#[test]
fn inserted_values_come_back_with_multiplicity() {
    let mut bag = Bag::new();
    for v in [5, 1, 5, 5, 2] {
        bag.insert(v);
    }
    assert_same_multiset(bag.to_vec(), [1, 2, 5, 5, 5]);
}

#[test]
fn default_bag_uses_thread_arena() {
    let bag: Bag<u32> = Bag::default();
    assert!(bag.storage().ptr_eq(&thread_arena()));
}

// ── Merging ──────────────────────────────────────────────────────────

#[test]
fn worked_example_adjacent_merge() {
    let mut a = Bag::new();
    a.extend([1, 2, 3]);
    let mut b = Bag::new();
    b.extend([4, 5]);
    let len_before = thread_arena().stats().value_len;

    a.merge(b);

    assert_eq!(sorted(a.to_vec()), vec![1, 2, 3, 4, 5]);
    assert_eq!(thread_arena().stats().value_len, len_before);
}

#[test]
fn merged_away_bag_is_empty() {
    let mut a: Bag<u32> = Bag::new();
    a.insert(1);
    let mut b = Bag::new();
    b.insert(2);

    let taken = b.take();
    a.merge(taken);

    assert!(b.is_empty());
    assert!(b.values().is_empty());
    assert_eq!(a.len(), 2);
}

#[test]
fn adjacent_merge_keeps_buffer_allocation() {
    let tracker = Tracker::new();
    let mut a = Bag::new();
    a.extend((0..100).map(|v| tracker.track(v)));
    let mut b = Bag::new();
    b.extend((100..150).map(|v| tracker.track(v)));
    let arena = a.storage().clone();
    let before = arena.stats();

    a.merge(b);

    let after = arena.stats();
    assert_eq!(after.value_len, before.value_len);
    assert_eq!(after.value_capacity, before.value_capacity);
    assert_eq!(tracker.clones(), 0);
    assert_eq!(a.len(), 150);
}

#[test]
fn empty_merge_keeps_identity() {
    let mut x: Bag<u32> = [7, 8].into_iter().collect();
    let id = x.interval_id();
    x.merge(Bag::new());
    assert_eq!(x.interval_id(), id);
    assert_eq!(sorted(x.to_vec()), vec![7, 8]);
}

#[test]
fn tree_of_merges_collects_everything() {
    // Leaves first, then parents folding their children in, like a
    // post-order traversal.
    let leaves: Vec<Bag<u32>> = (0..8u32)
        .map(|i| (i * 10..i * 10 + 3).collect())
        .collect();
    let mut level: Vec<Bag<u32>> = leaves;
    while level.len() > 1 {
        let mut next = Vec::new();
        let mut iter = level.into_iter();
        while let Some(mut left) = iter.next() {
            if let Some(right) = iter.next() {
                left.merge(right);
            }
            next.push(left);
        }
        level = next;
    }
    let root = level.pop().unwrap();

    let expected: Vec<u32> = (0..8u32).flat_map(|i| i * 10..i * 10 + 3).collect();
    assert_same_multiset(root.to_vec(), expected);
    thread_arena().validate().unwrap();
}

// ── Reclamation ──────────────────────────────────────────────────────

#[test]
fn dropping_every_bag_empties_arena() {
    let tracker = Tracker::new();
    let mut bags: Vec<Bag<_>> = (0..6)
        .map(|i| (0..=i).map(|v| tracker.track(v)).collect())
        .collect();
    // Grow some buried bags so the buffer is full of holes.
    bags[1].insert(tracker.track(99));
    bags[3].insert(tracker.track(98));
    let arena = bags[0].storage().clone();
    assert!(arena.stats().garbage_values > 0);

    // Drop out of order; the last one standing is the trailing bag.
    for i in [0, 2, 4, 5, 1] {
        let bag = std::mem::take(&mut bags[i]);
        drop(bag);
    }
    assert_eq!(arena.stats().live_intervals, 1);
    drop(bags);

    let stats = arena.stats();
    assert_eq!(stats.value_len, 0);
    assert_eq!(stats.interval_slots, 0);
    assert_eq!(tracker.live(), 0);
}

#[test]
fn slot_ids_are_reused_after_truncation() {
    let mut a = Bag::new();
    a.insert(1u32);
    let mut b = Bag::new();
    b.insert(2u32);
    assert_eq!(b.interval_id(), Some(SlotIndex(1)));
    drop(b);

    let mut c = Bag::new();
    c.insert(3u32);
    assert_eq!(c.interval_id(), Some(SlotIndex(1)));
    assert_eq!(sorted(a.to_vec()), vec![1]);
}

#[cfg(not(miri))]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn merging_in_any_order_preserves_all_values(
            groups in proptest::collection::vec(proptest::collection::vec(any::<u16>(), 0..6), 1..12),
            order in proptest::collection::vec(any::<usize>(), 0..24),
        ) {
            let arena = SharedStorage::new();
            let mut bags: Vec<Bag<u16>> = groups
                .iter()
                .map(|g| {
                    let mut bag = Bag::new_in(&arena);
                    for &v in g {
                        bag.insert(v);
                    }
                    bag
                })
                .collect();

            // Pairwise merges in a random order, then fold the rest.
            for pick in order {
                if bags.len() < 2 {
                    break;
                }
                let src = bags.swap_remove(pick % bags.len());
                let dst = pick / 7 % bags.len();
                bags[dst].merge(src);
                prop_assert!(arena.validate().is_ok());
            }
            let mut root = Bag::new_in(&arena);
            for bag in bags {
                root.merge(bag);
            }

            let expected: Vec<u16> = groups.into_iter().flatten().collect();
            prop_assert_eq!(sorted(root.to_vec()), sorted(expected));
            drop(root);
            prop_assert_eq!(arena.stats().value_len, 0);
        }
    }
}
