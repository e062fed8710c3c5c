//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use crate::slot_list::SlotIndex;

/// A structural invariant of a [`SlotList`](crate::SlotList) or
/// [`Storage`](crate::Storage) that does not hold.
///
/// Produced by the `validate()` methods. Bag operations never return these;
/// in debug builds a violation detected after a mutation aborts with the
/// violation's message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A live slot's `prev` link does not name the previous live slot.
    BrokenBackLink {
        /// The slot whose link is wrong.
        slot: SlotIndex,
        /// The previous live slot found by scanning.
        expected: Option<SlotIndex>,
        /// The link actually stored.
        found: Option<SlotIndex>,
    },
    /// A live slot's `next` link does not name the next live slot.
    BrokenForwardLink {
        /// The slot whose link is wrong.
        slot: SlotIndex,
        /// The next live slot found by scanning.
        expected: Option<SlotIndex>,
        /// The link actually stored.
        found: Option<SlotIndex>,
    },
    /// The list-wide first-used pointer is not the lowest live slot.
    FirstUsedMismatch {
        /// The lowest live slot found by scanning.
        expected: Option<SlotIndex>,
        /// The pointer actually stored.
        found: Option<SlotIndex>,
    },
    /// The physically last slot is a removed one (truncation was skipped).
    DeadTail {
        /// The removed slot left at the tail.
        slot: SlotIndex,
    },
    /// A registered interval has `begin >= end`.
    EmptyInterval {
        /// The slot holding the interval.
        slot: SlotIndex,
        /// Interval start.
        begin: usize,
        /// Interval end.
        end: usize,
    },
    /// A registered interval reaches past the value buffer.
    IntervalOutOfBounds {
        /// The slot holding the interval.
        slot: SlotIndex,
        /// Interval end.
        end: usize,
        /// Current value buffer length.
        value_len: usize,
    },
    /// Two live intervals share values, or a later slot starts before an
    /// earlier one ends.
    OverlappingIntervals {
        /// The lower slot.
        lower: SlotIndex,
        /// The higher slot.
        higher: SlotIndex,
    },
    /// The value buffer is non-empty while no interval is registered, or the
    /// other way round.
    EmptinessMismatch {
        /// Number of interval slots (apparent length).
        interval_slots: usize,
        /// Current value buffer length.
        value_len: usize,
    },
    /// The highest surviving interval does not end at the buffer tail.
    TailMismatch {
        /// The highest surviving slot.
        slot: SlotIndex,
        /// Its interval end.
        end: usize,
        /// Current value buffer length.
        value_len: usize,
    },
}

fn opt(slot: &Option<SlotIndex>) -> String {
    match slot {
        Some(s) => s.to_string(),
        None => "none".to_string(),
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BrokenBackLink {
                slot,
                expected,
                found,
            } => write!(
                f,
                "slot {slot}: previous link is {}, expected {}",
                opt(found),
                opt(expected)
            ),
            Self::BrokenForwardLink {
                slot,
                expected,
                found,
            } => write!(
                f,
                "slot {slot}: next link is {}, expected {}",
                opt(found),
                opt(expected)
            ),
            Self::FirstUsedMismatch { expected, found } => write!(
                f,
                "first used slot is {}, expected {}",
                opt(found),
                opt(expected)
            ),
            Self::DeadTail { slot } => {
                write!(f, "removed slot {slot} left at the physical tail")
            }
            Self::EmptyInterval { slot, begin, end } => {
                write!(f, "slot {slot}: empty interval [{begin}, {end})")
            }
            Self::IntervalOutOfBounds {
                slot,
                end,
                value_len,
            } => write!(
                f,
                "slot {slot}: interval end {end} exceeds value length {value_len}"
            ),
            Self::OverlappingIntervals { lower, higher } => {
                write!(f, "intervals of slots {lower} and {higher} overlap")
            }
            Self::EmptinessMismatch {
                interval_slots,
                value_len,
            } => write!(
                f,
                "{interval_slots} interval slots but {value_len} values"
            ),
            Self::TailMismatch {
                slot,
                end,
                value_len,
            } => write!(
                f,
                "trailing slot {slot} ends at {end} but value length is {value_len}"
            ),
        }
    }
}

impl Error for InvariantViolation {}

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The current thread's arena for this element type already exists, so
    /// its configuration can no longer change.
    AlreadyInitialised {
        /// Name of the element type.
        element: &'static str,
    },
    /// A structural check failed.
    Invariant(InvariantViolation),
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInitialised { element } => {
                write!(f, "thread arena for `{element}` is already initialised")
            }
            Self::Invariant(v) => write!(f, "arena invariant violated: {v}"),
        }
    }
}

impl Error for ArenaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invariant(v) => Some(v),
            Self::AlreadyInitialised { .. } => None,
        }
    }
}

impl From<InvariantViolation> for ArenaError {
    fn from(v: InvariantViolation) -> Self {
        Self::Invariant(v)
    }
}
