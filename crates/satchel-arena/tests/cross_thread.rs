//! Integration tests: bags built on different threads.
//!
//! Each thread has its own arena. Bags can still be sent between threads
//! and merged; those merges always copy into the receiving bag's arena.

use std::sync::mpsc;
use std::thread;

use satchel_arena::{configure_current_thread, Bag, SharedStorage, StorageConfig};
use satchel_test_utils::{assert_same_multiset, sorted};

#[test]
fn merge_bag_from_another_thread() {
    let mut a = Bag::new();
    a.insert(10u32);

    let b = thread::spawn(|| {
        let mut b = Bag::new();
        b.insert(20u32);
        b
    })
    .join()
    .unwrap();
    assert!(!a.shares_storage_with(&b));

    a.merge(b);

    assert_eq!(sorted(a.to_vec()), vec![10, 20]);
    assert!(a.storage().ptr_eq(&SharedStorage::for_current_thread()));
}

#[test]
fn foreign_arena_outlives_its_thread() {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let bag: Bag<u32> = (0..4).collect();
        tx.send(bag).unwrap();
    })
    .join()
    .unwrap();

    let orphan = rx.recv().unwrap();
    let arena = orphan.storage().clone();
    assert_eq!(arena.stats().value_len, 4);
    drop(orphan);
    assert_eq!(arena.stats().value_len, 0);
}

#[test]
fn worker_results_fold_into_one_bag() {
    let handles: Vec<_> = (0..4u32)
        .map(|w| {
            thread::spawn(move || {
                let mut local = Bag::new();
                for i in 0..25 {
                    local.insert(w * 100 + i);
                }
                local
            })
        })
        .collect();

    let mut total: Bag<u32> = Bag::new();
    for h in handles {
        total.merge(h.join().unwrap());
    }

    let expected: Vec<u32> = (0..4u32).flat_map(|w| (0..25).map(move |i| w * 100 + i)).collect();
    assert_same_multiset(total.to_vec(), expected);
    total.storage().validate().unwrap();
}

#[test]
fn opposite_cross_merges_do_not_deadlock() {
    let left = SharedStorage::<u32>::new();
    let right = SharedStorage::<u32>::new();

    let spawn = |dst: SharedStorage<u32>, src: SharedStorage<u32>| {
        thread::spawn(move || {
            let mut acc = Bag::new_in(&dst);
            for i in 0..200 {
                acc.insert(i);
                let mut other = Bag::new_in(&src);
                other.insert(i + 1000);
                acc.merge(other);
            }
            acc.len()
        })
    };
    let a = spawn(left.clone(), right.clone());
    let b = spawn(right.clone(), left.clone());

    assert_eq!(a.join().unwrap(), 400);
    assert_eq!(b.join().unwrap(), 400);
    assert_eq!(left.stats().value_len, 0);
    assert_eq!(right.stats().value_len, 0);
}

#[test]
fn configured_thread_arena_is_used_by_new_bags() {
    thread::spawn(|| {
        let arena =
            configure_current_thread::<u64>(&StorageConfig::new().with_value_capacity(10_000))
                .unwrap();
        let mut bag = Bag::new();
        bag.insert(1u64);
        assert!(bag.storage().ptr_eq(&arena));
        assert!(arena.stats().value_capacity >= 10_000);
    })
    .join()
    .unwrap();
}
