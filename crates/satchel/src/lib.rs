//! Satchel: arena-backed bags for collecting many small unordered result sets.
//!
//! This is the top-level facade crate that re-exports the public API of the
//! Satchel sub-crates. For most users, adding `satchel` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use satchel::prelude::*;
//!
//! // Per-node results of a traversal...
//! let mut left = Bag::new();
//! left.insert(1u32);
//! left.insert(2);
//! let mut right = Bag::new();
//! right.insert(3u32);
//!
//! // ...folded into the parent without copying: the two ranges are adjacent.
//! left.merge(right);
//!
//! let mut all = left.to_vec();
//! all.sort();
//! assert_eq!(all, vec![1, 2, 3]);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `satchel-arena` | Bags, arenas, slot lists, configuration, errors |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Bags, per-thread arenas and the slot list they are built on (`satchel-arena`).
///
/// Most users only need [`arena::Bag`]; it is also available in the
/// [`prelude`].
pub use satchel_arena as arena;

/// Common imports for typical Satchel usage.
///
/// ```rust
/// use satchel::prelude::*;
/// ```
pub mod prelude {
    pub use satchel_arena::{
        configure_current_thread, ArenaError, Bag, SharedStorage, StorageConfig, Values,
    };
}
