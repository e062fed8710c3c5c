//! The arena: one interval registry plus one append/truncate-only value buffer.
//!
//! A [`Storage`] owns a [`SlotList`] of [`Interval`]s and a `Vec<T>` of
//! values. Every live bag owns exactly one interval. Values are only ever
//! appended at the tail of the buffer and only ever reclaimed by truncating
//! the tail, so the buffer holds a mix of live ranges and dead "holes" left
//! behind by bags that were dropped or relocated.
//!
//! # Tail invariant
//!
//! When at least one interval is registered, the interval held by the
//! highest live slot ends exactly at `values.len()`. Slot order therefore
//! mirrors buffer order: a higher slot's range never starts before a lower
//! live slot's range ends.
//!
//! [`SharedStorage`] is the reference-counted, lockable handle bags hold.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::config::StorageConfig;
use crate::error::{ArenaError, InvariantViolation};
use crate::slot_list::{SlotIndex, SlotList};

/// A half-open range `[begin, end)` of offsets into a value buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    /// First offset in the range.
    pub begin: usize,
    /// One past the last offset.
    pub end: usize,
}

impl Interval {
    /// Number of values covered.
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    /// Whether the range covers no values.
    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    /// The range as a `Range<usize>` for slicing.
    pub fn range(&self) -> Range<usize> {
        self.begin..self.end
    }
}

/// Point-in-time occupancy numbers for a [`Storage`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Length of the value buffer, live and dead values together.
    pub value_len: usize,
    /// Allocated capacity of the value buffer.
    pub value_capacity: usize,
    /// Apparent length of the interval slot list.
    pub interval_slots: usize,
    /// Number of live intervals (bags holding values).
    pub live_intervals: usize,
    /// Values covered by live intervals.
    pub live_values: usize,
    /// Values in dead holes, waiting for tail truncation.
    pub garbage_values: usize,
}

/// Interval registry and value buffer shared by the bags of one arena.
#[derive(Debug)]
pub struct Storage<T> {
    pub(crate) intervals: SlotList<Interval>,
    pub(crate) values: Vec<T>,
}

impl<T> Storage<T> {
    /// Create an empty storage with default capacities.
    pub fn new() -> Self {
        Self::with_config(&StorageConfig::default())
    }

    /// Create an empty storage with the reservations from `config`.
    pub fn with_config(config: &StorageConfig) -> Self {
        Self {
            intervals: SlotList::with_capacity(config.initial_slot_capacity),
            values: Vec::with_capacity(config.initial_value_capacity),
        }
    }

    /// Length of the value buffer (live values plus garbage).
    pub fn value_len(&self) -> usize {
        self.values.len()
    }

    /// Allocated capacity of the value buffer.
    pub fn value_capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Apparent length of the interval slot list.
    pub fn interval_slots(&self) -> usize {
        self.intervals.apparent_len()
    }

    /// Number of live intervals. O(n).
    pub fn live_intervals(&self) -> usize {
        self.intervals.live_len()
    }

    /// The interval held by a live slot.
    pub fn interval(&self, id: SlotIndex) -> Interval {
        *self.intervals.get(id)
    }

    /// Occupancy numbers. O(n) in the number of live intervals.
    pub fn stats(&self) -> StorageStats {
        let (live_intervals, live_values) = self
            .intervals
            .iter()
            .fold((0, 0), |(n, v), (_, iv)| (n + 1, v + iv.len()));
        StorageStats {
            value_len: self.values.len(),
            value_capacity: self.values.capacity(),
            interval_slots: self.intervals.apparent_len(),
            live_intervals,
            live_values,
            garbage_values: self.values.len().saturating_sub(live_values),
        }
    }

    /// Full structural check: slot chain, interval bounds and ordering,
    /// emptiness agreement and the tail invariant.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        self.intervals.validate()?;

        let value_len = self.values.len();
        let mut previous: Option<(SlotIndex, Interval)> = None;
        for (slot, &iv) in &self.intervals {
            if iv.is_empty() {
                return Err(InvariantViolation::EmptyInterval {
                    slot,
                    begin: iv.begin,
                    end: iv.end,
                });
            }
            if iv.end > value_len {
                return Err(InvariantViolation::IntervalOutOfBounds {
                    slot,
                    end: iv.end,
                    value_len,
                });
            }
            if let Some((lower, prev)) = previous {
                if prev.end > iv.begin {
                    return Err(InvariantViolation::OverlappingIntervals {
                        lower,
                        higher: slot,
                    });
                }
            }
            previous = Some((slot, iv));
        }

        self.check_tail()
    }

    /// Whether `id` is the highest live slot, i.e. its range ends at the tail.
    pub(crate) fn is_trailing(&self, id: SlotIndex) -> bool {
        self.intervals.apparent_len() == id.0 + 1
    }

    /// Append `values` at the tail and register them as a new interval.
    ///
    /// Returns `None` (registering nothing) when `values` is empty.
    pub(crate) fn claim<I>(&mut self, values: I) -> Option<SlotIndex>
    where
        I: IntoIterator<Item = T>,
    {
        let begin = self.values.len();
        self.values.extend(values);
        let end = self.values.len();
        (end > begin).then(|| self.intervals.push(Interval { begin, end }))
    }

    /// Drop a live interval and truncate the value buffer to the new tail.
    ///
    /// If the released interval was the highest live one, the slot list
    /// truncates through any dead slots below it, and the values of all of
    /// them are dropped here.
    pub(crate) fn release(&mut self, id: SlotIndex) {
        self.intervals.remove(id);
        match self.intervals.last() {
            Some((_, last)) => {
                let end = last.end;
                self.values.truncate(end);
            }
            None => self.values.clear(),
        }
    }

    /// Cheap checks run after every mutating bag operation in debug builds.
    #[inline]
    pub(crate) fn debug_check(&self) {
        #[cfg(debug_assertions)]
        {
            #[cfg(feature = "extra-checks")]
            let result = self.validate();
            #[cfg(not(feature = "extra-checks"))]
            let result = self.check_tail();
            if let Err(v) = result {
                panic!("arena corrupted: {v}");
            }
        }
    }

    fn check_tail(&self) -> Result<(), InvariantViolation> {
        let value_len = self.values.len();
        match self.intervals.last() {
            None if value_len != 0 => Err(InvariantViolation::EmptinessMismatch {
                interval_slots: 0,
                value_len,
            }),
            None => Ok(()),
            Some((slot, iv)) if iv.end != value_len => Err(InvariantViolation::TailMismatch {
                slot,
                end: iv.end,
                value_len,
            }),
            Some(_) => Ok(()),
        }
    }
}

impl<T: Clone> Storage<T> {
    /// Copy the values of a live interval to the tail as a new interval.
    ///
    /// The source slot stays registered; the caller decides when to release it.
    pub(crate) fn claim_copy(&mut self, source: SlotIndex) -> SlotIndex {
        let range = self.interval(source).range();
        let begin = self.values.len();
        self.values.reserve(range.len());
        self.values.extend_from_within(range);
        let end = self.values.len();
        self.intervals.push(Interval { begin, end })
    }
}

impl<T> Default for Storage<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A cloneable, lockable handle to a [`Storage`].
///
/// Every bag holds one, so a storage lives as long as its last bag or its
/// thread registry entry, whichever goes last. Cloning the handle does not
/// clone the storage.
pub struct SharedStorage<T> {
    inner: Arc<Mutex<Storage<T>>>,
}

impl<T: 'static> SharedStorage<T> {
    /// The calling thread's arena for `T`, created on first use.
    pub fn for_current_thread() -> Self {
        crate::local::current()
    }
}

impl<T> SharedStorage<T> {
    /// Create a new, detached arena with default capacities.
    pub fn new() -> Self {
        Self::with_config(&StorageConfig::default())
    }

    /// Create a new, detached arena.
    pub fn with_config(config: &StorageConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Storage::with_config(config))),
        }
    }

    /// Whether both handles refer to the same arena.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Occupancy numbers of the arena.
    ///
    /// Blocks while a [`Values`](crate::Values) guard of this arena is alive
    /// on another thread; deadlocks if one is alive on this thread.
    pub fn stats(&self) -> StorageStats {
        self.inner.lock().stats()
    }

    /// Run [`Storage::validate`] on the arena.
    ///
    /// # Errors
    ///
    /// [`ArenaError::Invariant`] naming the first violation found.
    pub fn validate(&self) -> Result<(), ArenaError> {
        self.inner.lock().validate().map_err(ArenaError::from)
    }

    /// Run `f` with shared access to the arena.
    pub fn with<R>(&self, f: impl FnOnce(&Storage<T>) -> R) -> R {
        f(&self.inner.lock())
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Storage<T>> {
        self.inner.lock()
    }

    /// Lock two distinct arenas, always in address order, so two threads
    /// locking the same pair from opposite sides cannot deadlock.
    ///
    /// The guards are returned in argument order.
    pub(crate) fn lock_pair<'a>(
        a: &'a Self,
        b: &'a Self,
    ) -> (MutexGuard<'a, Storage<T>>, MutexGuard<'a, Storage<T>>) {
        assert!(!a.ptr_eq(b), "lock_pair called with the same arena twice");
        if Arc::as_ptr(&a.inner) < Arc::as_ptr(&b.inner) {
            let ga = a.inner.lock();
            let gb = b.inner.lock();
            (ga, gb)
        } else {
            let gb = b.inner.lock();
            let ga = a.inner.lock();
            (ga, gb)
        }
    }
}

impl<T> Clone for SharedStorage<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for SharedStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SharedStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedStorage")
            .field(&Arc::as_ptr(&self.inner))
            .finish()
    }
}
