//! Hierarchical bump-allocated regions with scoped, stack-ordered release.
//!
//! A [`RegionTree`] wraps a caller-owned byte buffer. Memory is handed out
//! by bumping a region's high-water mark, and regions can be nested:
//!
//! ```text
//! RegionTree (owns &mut [u8] + slab of region nodes)
//! └── root region (whole buffer)
//!     ├── allocations (bump, never freed individually)
//!     ├── spawned regions (permanent; reclaimed with an ancestor reset)
//!     │   └── Stack<T> / RawStack (header + fixed-capacity payload)
//!     └── scoped regions (push / pop in LIFO order, zeroed on pop)
//! ```
//!
//! # Failure classes
//!
//! - [`ArenaError::OutOfSpace`] is recoverable and never mutates state.
//! - Protocol violations (out-of-order pop, reset with open children, stale
//!   handles) and stack overruns are fatal. They are logged at `error` level
//!   and either returned or turned into a panic, per [`ViolationPolicy`].
//!
//! # Threading
//!
//! A tree has no internal locking; mutation requires `&mut RegionTree`.
//! Independent trees can live on different threads freely.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod element;
pub mod error;
pub mod handle;
mod slab;
pub mod stack;
pub mod tree;

// Public re-exports for the primary API surface.
pub use config::{ArenaConfig, ViolationPolicy};
pub use element::Element;
pub use error::{ArenaError, ProtocolViolation};
pub use handle::{Allocation, RegionId, ScopedRegion};
pub use stack::{RawStack, Stack, StackHeader, HEADER_SIZE};
pub use tree::RegionTree;
