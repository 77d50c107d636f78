//! Thread, semaphore, and shared-tree primitives for strata callers.
//!
//! `strata-arena` never locks and never starts threads. Code that shares a
//! region tree between threads, or fans work out and waits for it, uses the
//! pieces here:
//!
//! - [`SharedTree`]: a region tree behind a mutex.
//! - [`Semaphore`]: counting semaphore for completion signalling.
//! - [`spawn_detached`] and [`cpu_count`]: thread start-up helpers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod semaphore;
pub mod shared;
pub mod thread;

pub use error::SyncError;
pub use semaphore::{Semaphore, MAX_SEMAPHORE_VALUE};
pub use shared::SharedTree;
pub use thread::{cpu_count, spawn_detached};
