//! Test fixtures and assertion helpers for strata development.
//!
//! Provides buffer constructors, a [`RegionSnapshot`] for "nothing changed"
//! assertions, log capture via [`init_tracing`], and the reusable workloads
//! in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::Once;

use strata_arena::{ArenaError, RegionId, RegionTree};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Route `tracing` output to the test harness, filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A zero-filled backing buffer.
pub fn zeroed_buffer(len: usize) -> Vec<u8> {
    vec![0; len]
}

/// A backing buffer filled with `byte`, for spotting untouched memory.
pub fn filled_buffer(len: usize, byte: u8) -> Vec<u8> {
    vec![byte; len]
}

/// Whether every byte is zero.
pub fn is_zeroed(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| b == 0)
}

/// Observable accounting state of one region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionSnapshot {
    pub used: usize,
    pub capacity: usize,
    pub open_children: usize,
}

impl RegionSnapshot {
    /// Capture the accounting state of `region`.
    pub fn capture(tree: &RegionTree<'_>, region: RegionId) -> Result<Self, ArenaError> {
        Ok(Self {
            used: tree.used(region)?,
            capacity: tree.capacity(region)?,
            open_children: tree.open_children(region)?,
        })
    }

    pub fn available(&self) -> usize {
        self.capacity - self.used
    }
}
