//! Strata: a hierarchical region allocator with scoped, stack-ordered release.
//!
//! This is the facade crate that re-exports the public API of the strata
//! sub-crates. For most users, adding `strata` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use strata::prelude::*;
//!
//! let mut buffer = vec![0u8; 1024];
//! let mut tree = RegionTree::init(Some(&mut buffer));
//! let root = tree.root();
//!
//! // A long-lived table, carved permanently from the root.
//! let ids = Stack::<u32>::create(&mut tree, root, 16).unwrap();
//! ids.push(&mut tree, 42).unwrap();
//!
//! // Scratch space for one computation, released in stack order.
//! let scratch = tree.push(root, 128).unwrap();
//! let tmp = tree.allocate(scratch.region(), 64).unwrap();
//! tree.bytes_mut(tmp).unwrap().fill(1);
//! tree.pop(scratch).unwrap();
//!
//! assert_eq!(ids.count(&tree).unwrap(), 1);
//! assert_eq!(tree.open_children(root).unwrap(), 0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `strata-arena` | Region tree, handles, stacks, errors |
//! | [`sync`] | `strata-sync` | Shared tree, semaphore, thread helpers |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Region tree, handles, and fixed-capacity stacks (`strata-arena`).
pub use strata_arena as arena;

/// Primitives for sharing a tree across threads (`strata-sync`).
///
/// The arena itself never locks; [`sync::SharedTree`] is the mutex callers
/// put around a tree that more than one thread touches.
pub use strata_sync as sync;

/// Common imports for typical strata usage.
///
/// ```rust
/// use strata::prelude::*;
/// ```
pub mod prelude {
    // Regions
    pub use strata_arena::{Allocation, ArenaConfig, RegionId, RegionTree, ScopedRegion};

    // Stacks
    pub use strata_arena::{Element, RawStack, Stack};

    // Errors
    pub use strata_arena::{ArenaError, ProtocolViolation, ViolationPolicy};

    // Threads
    pub use strata_sync::{Semaphore, SharedTree, SyncError};
}
