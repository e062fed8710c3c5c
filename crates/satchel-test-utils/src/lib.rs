//! Test utilities for Satchel development.
//!
//! - [`Tracker`] / [`Tracked`]: an element wrapper that counts clones and
//!   drops, for asserting that a code path moved values instead of copying
//!   them, and that no value leaked.
//! - [`counts`], [`sorted`], [`assert_same_multiset`]: order-insensitive
//!   comparison helpers, since bags do not preserve insertion order.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Counters {
    created: AtomicUsize,
    clones: AtomicUsize,
    drops: AtomicUsize,
}

/// Hands out [`Tracked`] values sharing one set of counters.
///
/// Counters are atomic so tracked values may cross threads.
#[derive(Clone, Debug, Default)]
pub struct Tracker {
    counters: Arc<Counters>,
}

impl Tracker {
    /// A tracker with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `value` so that its clones and drops are counted.
    pub fn track<T>(&self, value: T) -> Tracked<T> {
        self.counters.created.fetch_add(1, Ordering::Relaxed);
        Tracked {
            value,
            counters: Arc::clone(&self.counters),
        }
    }

    /// Number of `Clone::clone` calls on tracked values.
    pub fn clones(&self) -> usize {
        self.counters.clones.load(Ordering::Relaxed)
    }

    /// Number of tracked values dropped (originals and clones).
    pub fn drops(&self) -> usize {
        self.counters.drops.load(Ordering::Relaxed)
    }

    /// Tracked values (originals and clones) still alive.
    pub fn live(&self) -> usize {
        self.counters.created.load(Ordering::Relaxed) + self.clones() - self.drops()
    }
}

/// A value whose clones and drops are reported to a [`Tracker`].
#[derive(Debug)]
pub struct Tracked<T> {
    /// The wrapped value.
    pub value: T,
    counters: Arc<Counters>,
}

impl<T: Clone> Clone for Tracked<T> {
    fn clone(&self) -> Self {
        self.counters.clones.fetch_add(1, Ordering::Relaxed);
        Self {
            value: self.value.clone(),
            counters: Arc::clone(&self.counters),
        }
    }
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        self.counters.drops.fetch_add(1, Ordering::Relaxed);
    }
}

/// Multiplicity of every distinct item.
pub fn counts<T: Ord>(items: impl IntoIterator<Item = T>) -> BTreeMap<T, usize> {
    let mut map = BTreeMap::new();
    for item in items {
        *map.entry(item).or_insert(0) += 1;
    }
    map
}

/// The items in ascending order.
pub fn sorted<T: Ord>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut v: Vec<T> = items.into_iter().collect();
    v.sort();
    v
}

/// Assert that both sides hold the same items with the same multiplicities.
#[track_caller]
pub fn assert_same_multiset<T: Ord + Debug>(
    actual: impl IntoIterator<Item = T>,
    expected: impl IntoIterator<Item = T>,
) {
    assert_eq!(counts(actual), counts(expected), "multisets differ");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_counts_clones_and_drops() {
        let tracker = Tracker::new();
        let a = tracker.track(1);
        let b = a.clone();
        assert_eq!(tracker.clones(), 1);
        assert_eq!(tracker.live(), 2);
        drop(a);
        drop(b);
        assert_eq!(tracker.drops(), 2);
        assert_eq!(tracker.live(), 0);
    }

    #[test]
    fn multiset_ignores_order_but_not_multiplicity() {
        assert_same_multiset([3, 1, 1], [1, 3, 1]);
        assert_ne!(counts([1, 1]), counts([1]));
        assert_eq!(sorted([2, 0, 1]), vec![0, 1, 2]);
    }
}
