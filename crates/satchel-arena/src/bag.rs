//! Mergeable multiset handles over arena ranges.
//!
//! A [`Bag`] owns one contiguous range of its arena's value buffer, or
//! nothing when empty. Growing a bag always happens at the buffer tail, so
//! a bag that is not the trailing one is first *promoted*: its values are
//! copied to the tail and its old range becomes a hole.
//!
//! Merging two bags of the same arena whose ranges touch is O(1): the lower
//! interval is stretched over the upper one and the upper slot is dropped.
//! Otherwise the smaller-indexed bag's values are copied after the other's.
//!
//! ```text
//!  values: [ a a a | b b ]          a = slot 0, b = slot 1 (trailing)
//!  a.merge(b)  →  [ a a a b b ]     a = slot 0, no values moved
//!
//!  values: [ a | c | b ]            c sits between a and b
//!  a.merge(b)  →  [ a | c | b a ]   result = slot of b, a's old range is a hole
//! ```
//!
//! Element order inside a bag is unspecified.

use std::fmt;
use std::ops::Deref;

use parking_lot::{MappedMutexGuard, MutexGuard};
use tracing::trace;

use crate::slot_list::SlotIndex;
use crate::storage::{SharedStorage, Storage};

/// An unordered collection of values stored in a shared arena.
///
/// Dropping a bag releases its range; if the range was at the tail of the
/// buffer, the buffer is truncated back to the next live range.
///
/// # Locking
///
/// Every operation briefly locks the bag's arena. A [`Values`] guard keeps
/// the arena locked for as long as it lives, so mutating, measuring or
/// dropping any bag of the same arena on the same thread while a guard is
/// alive deadlocks.
pub struct Bag<T> {
    storage: SharedStorage<T>,
    /// Slot of the interval holding this bag's values; `None` when empty.
    interval: Option<SlotIndex>,
}

/// Relocate the values of `id` to the tail unless they already end there.
///
/// Returns the slot now holding them. The old slot is released and its range
/// stays behind as garbage until tail truncation reaches it.
fn ensure_last_interval<T: Clone>(storage: &mut Storage<T>, id: SlotIndex) -> SlotIndex {
    if storage.is_trailing(id) {
        return id;
    }
    let moved = storage.claim_copy(id);
    storage.release(id);
    trace!(
        from = %id,
        to = %moved,
        len = storage.interval(moved).len(),
        "promoted interval to the tail"
    );
    moved
}

impl<T: 'static> Bag<T> {
    /// Create an empty bag bound to the calling thread's arena.
    pub fn new() -> Self {
        Self::new_in(&SharedStorage::for_current_thread())
    }
}

impl<T> Bag<T> {
    /// Create an empty bag bound to `storage`.
    pub fn new_in(storage: &SharedStorage<T>) -> Self {
        Self {
            storage: storage.clone(),
            interval: None,
        }
    }

    /// Whether the bag holds no values.
    pub fn is_empty(&self) -> bool {
        self.interval.is_none()
    }

    /// Number of values in the bag.
    pub fn len(&self) -> usize {
        match self.interval {
            Some(id) => self.storage.lock().interval(id).len(),
            None => 0,
        }
    }

    /// Slot of the interval holding the values, `None` when empty.
    ///
    /// Slots are reused once the arena's tail is truncated, so this only
    /// identifies the bag among the bags alive right now.
    pub fn interval_id(&self) -> Option<SlotIndex> {
        self.interval
    }

    /// The arena this bag lives in.
    pub fn storage(&self) -> &SharedStorage<T> {
        &self.storage
    }

    /// Whether both bags live in the same arena.
    pub fn shares_storage_with(&self, other: &Bag<T>) -> bool {
        self.storage.ptr_eq(&other.storage)
    }

    /// Exchange contents (and arenas) with `other`. O(1).
    pub fn swap(&mut self, other: &mut Bag<T>) {
        std::mem::swap(self, other);
    }

    /// Move the contents out, leaving `self` empty in the same arena.
    pub fn take(&mut self) -> Bag<T> {
        let empty = Bag::new_in(&self.storage);
        std::mem::replace(self, empty)
    }

    /// Borrow the bag's values as a slice.
    ///
    /// The returned guard holds the arena lock; see the type-level docs.
    pub fn values(&self) -> Values<'_, T> {
        let inner = self.interval.map(|id| {
            MutexGuard::map(self.storage.lock(), |st| {
                let range = st.interval(id).range();
                &mut st.values[range]
            })
        });
        Values { inner }
    }
}

impl<T: Clone> Bag<T> {
    /// Add one value. O(1) amortized when the bag is already trailing,
    /// O(len) when it has to be promoted first.
    pub fn insert(&mut self, value: T) {
        let mut st = self.storage.lock();
        match self.interval {
            None => self.interval = st.claim(std::iter::once(value)),
            Some(id) => {
                let id = ensure_last_interval(&mut st, id);
                st.values.push(value);
                st.intervals[id].end += 1;
                self.interval = Some(id);
            }
        }
        st.debug_check();
    }

    /// Move every value of `other` into `self`.
    ///
    /// O(1) amortized when both bags share an arena and their ranges are
    /// adjacent once the higher-slotted one sits at the tail. Otherwise the
    /// values of one side are copied. When the arenas differ, the result
    /// stays in `self`'s arena.
    pub fn merge(&mut self, mut other: Bag<T>) {
        let Some(other_id) = other.interval else {
            return;
        };
        let Some(id) = self.interval else {
            self.swap(&mut other);
            return;
        };
        if !self.shares_storage_with(&other) {
            self.merge_foreign(&mut other, id, other_id);
            return;
        }

        // The lower slot's range lies before the higher slot's once the
        // higher one has been moved to the tail.
        let (low, high) = if id < other_id {
            (id, other_id)
        } else {
            (other_id, id)
        };
        let mut st = self.storage.lock();
        let high = ensure_last_interval(&mut st, high);
        let low_iv = st.interval(low);
        let high_iv = st.interval(high);
        debug_assert!(low_iv.end <= high_iv.begin);

        let merged = if low_iv.end == high_iv.begin {
            st.intervals[low].end = high_iv.end;
            st.intervals.remove(high);
            trace!(slot = %low, len = low_iv.len() + high_iv.len(), "merged adjacent intervals");
            low
        } else {
            st.values.reserve(low_iv.len());
            st.values.extend_from_within(low_iv.range());
            let end = st.values.len();
            st.intervals[high].end = end;
            st.release(low);
            trace!(slot = %high, copied = low_iv.len(), "merged by copying");
            high
        };
        st.debug_check();
        drop(st);

        self.interval = Some(merged);
        other.interval = None;
    }

    /// Merge a bag living in another arena by appending its values to ours.
    fn merge_foreign(&mut self, other: &mut Bag<T>, id: SlotIndex, other_id: SlotIndex) {
        let (mut st, mut other_st) = SharedStorage::lock_pair(&self.storage, &other.storage);
        let id = ensure_last_interval(&mut st, id);
        let source = other_st.interval(other_id);

        st.values.reserve(source.len());
        if other_st.is_trailing(other_id) {
            // Nothing after the source range, so the values can move out.
            st.values.extend(other_st.values.drain(source.range()));
        } else {
            st.values
                .extend(other_st.values[source.range()].iter().cloned());
        }
        let end = st.values.len();
        st.intervals[id].end = end;
        other_st.release(other_id);
        st.debug_check();
        other_st.debug_check();
        trace!(slot = %id, copied = source.len(), "merged bag from another arena");
        drop(st);
        drop(other_st);

        self.interval = Some(id);
        other.interval = None;
    }

    /// Clone the values into a `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        self.values().to_vec()
    }

    /// Turn the bag into a `Vec`, moving the values out when the bag is
    /// trailing and cloning them otherwise.
    pub fn into_vec(mut self) -> Vec<T> {
        let Some(id) = self.interval.take() else {
            return Vec::new();
        };
        let mut st = self.storage.lock();
        let range = st.interval(id).range();
        let out: Vec<T> = if st.is_trailing(id) {
            st.values.drain(range).collect()
        } else {
            st.values[range].to_vec()
        };
        st.release(id);
        st.debug_check();
        out
    }
}

impl<T> Drop for Bag<T> {
    fn drop(&mut self) {
        if let Some(id) = self.interval.take() {
            let mut st = self.storage.lock();
            st.release(id);
            st.debug_check();
        }
    }
}

impl<T: 'static> Default for Bag<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Bag<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bag")
            .field("interval", &self.interval)
            .field("values", &&*self.values())
            .finish()
    }
}

impl<T: Clone> Extend<T> for Bag<T> {
    /// Append all values in one go, promoting at most once.
    ///
    /// The iterator is drained before the arena is locked, so it may read
    /// other bags of the same arena, and a panic inside it leaves the arena
    /// untouched.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let items: Vec<T> = iter.into_iter().collect();
        if items.is_empty() {
            return;
        }
        let mut st = self.storage.lock();
        match self.interval {
            None => self.interval = st.claim(items),
            Some(id) => {
                let id = ensure_last_interval(&mut st, id);
                st.values.extend(items);
                let end = st.values.len();
                st.intervals[id].end = end;
                self.interval = Some(id);
            }
        }
        st.debug_check();
    }
}

impl<T: Clone> Extend<Bag<T>> for Bag<T> {
    fn extend<I: IntoIterator<Item = Bag<T>>>(&mut self, iter: I) {
        for bag in iter {
            self.merge(bag);
        }
    }
}

impl<T: Clone + 'static> FromIterator<T> for Bag<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut bag = Bag::new();
        bag.extend(iter);
        bag
    }
}

impl<T: Clone + 'static> FromIterator<Bag<T>> for Bag<T> {
    fn from_iter<I: IntoIterator<Item = Bag<T>>>(iter: I) -> Self {
        let mut bag = Bag::new();
        bag.extend(iter);
        bag
    }
}

impl<T: Clone> IntoIterator for Bag<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

/// Shared view of a bag's values, holding its arena's lock.
pub struct Values<'a, T> {
    inner: Option<MappedMutexGuard<'a, [T]>>,
}

impl<T> Deref for Values<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        match &self.inner {
            Some(guard) => &**guard,
            None => &[],
        }
    }
}

impl<'v, T> IntoIterator for &'v Values<'_, T> {
    type Item = &'v T;
    type IntoIter = std::slice::Iter<'v, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for Values<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
