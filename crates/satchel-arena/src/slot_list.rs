//! Index-stable list with O(1) removal.
//!
//! A [`SlotList`] hands out a [`SlotIndex`] on every [`push`](SlotList::push)
//! and never shifts an index afterwards. Removal unlinks the slot from a
//! doubly linked chain of live slots threaded through the backing `Vec`.
//! Memory is only reclaimed from the tail: removing the highest live slot
//! truncates the `Vec` back to the next live slot below it, dropping any
//! run of already-removed slots on the way. Removed slots in the middle
//! stay allocated until a later truncation reaches them.
//!
//! ```text
//!  index:   0     1     2     3     4
//!         [live][dead][live][dead][live]     apparent_len = 5
//!            └─────────>└─────────>┘         live chain
//!
//!  remove(4) truncates through the dead slot 3:
//!         [live][dead][live]                 apparent_len = 3
//! ```
//!
//! Because truncation shortens the list, a later `push` may receive an index
//! that an earlier, since-removed slot also had. Holders of a `SlotIndex`
//! must not use it after removing it.

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::error::InvariantViolation;

/// Raw link value meaning "no slot".
const NONE: usize = usize::MAX;

/// Identifies a slot within a [`SlotList`].
///
/// Assigned at push time as the list's apparent length, so indices grow
/// with insertion order until the tail is truncated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex(pub usize);

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for SlotIndex {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

/// The live neighbours of a slot at the moment it was removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighbours {
    /// Highest live slot below the removed one.
    pub prev: Option<SlotIndex>,
    /// Lowest live slot above the removed one.
    pub next: Option<SlotIndex>,
}

#[derive(Clone, Debug)]
struct Entry<P> {
    prev: usize,
    next: usize,
    payload: P,
    #[cfg(debug_assertions)]
    deleted: bool,
}

fn link(raw: usize) -> Option<SlotIndex> {
    (raw != NONE).then_some(SlotIndex(raw))
}

/// A `Vec`-backed sequence of slots with stable indices and O(1) removal.
#[derive(Clone, Debug)]
pub struct SlotList<P> {
    entries: Vec<Entry<P>>,
    /// Lowest live slot, or `NONE` when the list is empty.
    first_used: usize,
}

impl<P> SlotList<P> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty list with room for `capacity` slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            first_used: NONE,
        }
    }

    /// Append a slot and return its index (the current apparent length).
    pub fn push(&mut self, payload: P) -> SlotIndex {
        let index = self.entries.len();
        let prev = match self.entries.last_mut() {
            // The physical tail is always live, so it is the chain's last link.
            Some(last) => {
                last.next = index;
                index - 1
            }
            None => {
                self.first_used = index;
                NONE
            }
        };
        self.entries.push(Entry {
            prev,
            next: NONE,
            payload,
            #[cfg(debug_assertions)]
            deleted: false,
        });
        self.debug_check();
        SlotIndex(index)
    }

    /// Shared access to a live slot's payload.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range. In debug builds, also panics if the
    /// slot has been removed.
    pub fn get(&self, index: SlotIndex) -> &P {
        let entry = &self.entries[index.0];
        #[cfg(debug_assertions)]
        assert!(!entry.deleted, "slot {index} has been removed");
        &entry.payload
    }

    /// Mutable access to a live slot's payload.
    ///
    /// # Panics
    ///
    /// Same conditions as [`get`](Self::get).
    pub fn get_mut(&mut self, index: SlotIndex) -> &mut P {
        let entry = &mut self.entries[index.0];
        #[cfg(debug_assertions)]
        assert!(!entry.deleted, "slot {index} has been removed");
        &mut entry.payload
    }

    /// Remove a live slot and return its live neighbours.
    ///
    /// If the slot was the highest live one, the backing storage is truncated
    /// to `prev + 1` (or emptied when there is no `prev`). Otherwise nothing
    /// is reclaimed and the slot stays allocated but unreachable.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range. In debug builds, also panics if the
    /// slot was already removed.
    pub fn remove(&mut self, index: SlotIndex) -> Neighbours {
        let i = index.0;
        let len = self.entries.len();
        assert!(i < len, "slot {index} out of range (apparent length {len})");
        #[cfg(debug_assertions)]
        {
            assert!(!self.entries[i].deleted, "slot {index} removed twice");
            self.entries[i].deleted = true;
        }

        let prev = self.entries[i].prev;
        let next = self.entries[i].next;
        if prev == NONE {
            self.first_used = next;
        } else {
            self.entries[prev].next = next;
        }

        if next == NONE {
            // Everything in (prev, i] is dead now.
            let keep = if prev == NONE { 0 } else { prev + 1 };
            #[cfg(debug_assertions)]
            debug_assert!(self.entries[keep..].iter().all(|e| e.deleted));
            self.entries.truncate(keep);
        } else {
            self.entries[next].prev = prev;
        }

        self.debug_check();
        Neighbours {
            prev: link(prev),
            next: link(next),
        }
    }

    /// Whether no slot is allocated.
    ///
    /// Since the physical tail is always live, this is also "no live slot".
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Physical length of the backing storage.
    ///
    /// `0` when empty, otherwise one past the highest live slot. An upper
    /// bound on [`live_len`](Self::live_len).
    pub fn apparent_len(&self) -> usize {
        self.entries.len()
    }

    /// Number of live slots. O(n) in the live count.
    pub fn live_len(&self) -> usize {
        self.iter().count()
    }

    /// Lowest live slot.
    pub fn first_used(&self) -> Option<SlotIndex> {
        link(self.first_used)
    }

    /// The highest live slot and its payload.
    pub fn last(&self) -> Option<(SlotIndex, &P)> {
        let index = self.entries.len().checked_sub(1)?;
        Some((SlotIndex(index), &self.entries[index].payload))
    }

    /// Iterate live slots in increasing index order.
    pub fn iter(&self) -> Iter<'_, P> {
        Iter {
            entries: &self.entries,
            cursor: self.first_used,
        }
    }

    /// Check the live chain against the backing storage.
    ///
    /// Walks every slot, so this is O(apparent length).
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        #[cfg(debug_assertions)]
        self.validate_flags()?;

        let len = self.entries.len();
        let mut prev = NONE;
        let mut cur = self.first_used;
        while cur != NONE {
            if cur >= len || (prev != NONE && cur <= prev) {
                return Err(match prev {
                    NONE => InvariantViolation::FirstUsedMismatch {
                        expected: None,
                        found: link(cur),
                    },
                    _ => InvariantViolation::BrokenForwardLink {
                        slot: SlotIndex(prev),
                        expected: None,
                        found: link(cur),
                    },
                });
            }
            let entry = &self.entries[cur];
            if entry.prev != prev {
                return Err(InvariantViolation::BrokenBackLink {
                    slot: SlotIndex(cur),
                    expected: link(prev),
                    found: link(entry.prev),
                });
            }
            prev = cur;
            cur = entry.next;
        }

        match len.checked_sub(1) {
            Some(tail) if prev != tail => Err(InvariantViolation::DeadTail {
                slot: SlotIndex(tail),
            }),
            _ => Ok(()),
        }
    }

    /// Cross-check the links against the per-slot `deleted` flags.
    #[cfg(debug_assertions)]
    fn validate_flags(&self) -> Result<(), InvariantViolation> {
        let mut last_live = NONE;
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.deleted {
                continue;
            }
            if entry.prev != last_live {
                return Err(InvariantViolation::BrokenBackLink {
                    slot: SlotIndex(i),
                    expected: link(last_live),
                    found: link(entry.prev),
                });
            }
            last_live = i;
        }

        let mut next_live = NONE;
        for (i, entry) in self.entries.iter().enumerate().rev() {
            if entry.deleted {
                continue;
            }
            if entry.next != next_live {
                return Err(InvariantViolation::BrokenForwardLink {
                    slot: SlotIndex(i),
                    expected: link(next_live),
                    found: link(entry.next),
                });
            }
            next_live = i;
        }

        if self.first_used != next_live {
            return Err(InvariantViolation::FirstUsedMismatch {
                expected: link(next_live),
                found: link(self.first_used),
            });
        }
        match self.entries.last() {
            Some(tail) if tail.deleted => Err(InvariantViolation::DeadTail {
                slot: SlotIndex(self.entries.len() - 1),
            }),
            _ => Ok(()),
        }
    }

    #[inline]
    fn debug_check(&self) {
        #[cfg(all(debug_assertions, feature = "extra-checks"))]
        if let Err(v) = self.validate() {
            panic!("slot list corrupted: {v}");
        }
    }
}

impl<P> Default for SlotList<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Index<SlotIndex> for SlotList<P> {
    type Output = P;

    fn index(&self, index: SlotIndex) -> &P {
        self.get(index)
    }
}

impl<P> IndexMut<SlotIndex> for SlotList<P> {
    fn index_mut(&mut self, index: SlotIndex) -> &mut P {
        self.get_mut(index)
    }
}

/// Iterator over the live slots of a [`SlotList`], lowest index first.
pub struct Iter<'a, P> {
    entries: &'a [Entry<P>],
    cursor: usize,
}

impl<'a, P> Iterator for Iter<'a, P> {
    type Item = (SlotIndex, &'a P);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NONE {
            return None;
        }
        let index = self.cursor;
        let entry = &self.entries[index];
        self.cursor = entry.next;
        Some((SlotIndex(index), &entry.payload))
    }
}

impl<'a, P> IntoIterator for &'a SlotList<P> {
    type Item = (SlotIndex, &'a P);
    type IntoIter = Iter<'a, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
