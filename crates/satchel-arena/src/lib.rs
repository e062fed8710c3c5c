//! Thread-scoped arena storage and mergeable bags for Satchel.
//!
//! Collects many small unordered result sets and folds them into larger
//! ones without an allocation or a full copy per merge. All values of one
//! element type on one thread live in a single growable buffer; a bag is an
//! index into a registry of ranges over that buffer.
//!
//! # Architecture
//!
//! ```text
//! Bag<T> (handle: arena + slot)
//! └── SharedStorage<T>  (Arc<Mutex<_>>, one per thread per T, lazily created)
//!     └── Storage<T>
//!         ├── SlotList<Interval>  (stable slot indices, O(1) removal,
//!         │                        tail-only reclamation)
//!         └── Vec<T>              (append at the tail, truncate from the tail)
//! ```
//!
//! # Merge paths
//!
//! - **Adjacent:** both bags share an arena and, once the higher-slotted one
//!   sits at the tail, the lower one ends where it begins. The lower
//!   interval is extended; no value moves.
//! - **Copy:** otherwise the values of one side are appended at the tail.
//!   Bags from different arenas always take this path, and the result stays
//!   in the receiving bag's arena.
//!
//! # Debug checks
//!
//! Debug builds verify the tail invariant after every mutating operation
//! and panic on a violation. With the `extra-checks` feature the full O(n)
//! slot chain and interval ordering scan runs as well.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bag;
pub mod config;
pub mod error;
pub mod local;
pub mod slot_list;
pub mod storage;

// Public re-exports for the primary API surface.
pub use bag::{Bag, Values};
pub use config::StorageConfig;
pub use error::{ArenaError, InvariantViolation};
pub use local::{configure_current_thread, is_initialised};
pub use slot_list::{Neighbours, SlotIndex, SlotList};
pub use storage::{Interval, SharedStorage, Storage, StorageStats};
