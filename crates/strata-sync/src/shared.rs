//! A region tree behind a mutex.
//!
//! A [`RegionTree`] does no locking of its own. [`SharedTree`] is the
//! external exclusion a multi-threaded caller needs: every operation runs
//! inside [`SharedTree::with`] while holding the lock, so at most one writer
//! touches the tree at a time.

use std::sync::Mutex;

use strata_arena::RegionTree;

use crate::error::SyncError;

/// A [`RegionTree`] that can be shared between threads.
#[derive(Debug)]
pub struct SharedTree<'buf> {
    inner: Mutex<RegionTree<'buf>>,
}

impl<'buf> SharedTree<'buf> {
    /// Take ownership of `tree`.
    pub fn new(tree: RegionTree<'buf>) -> Self {
        Self {
            inner: Mutex::new(tree),
        }
    }

    /// Run `f` with exclusive access to the tree.
    ///
    /// Fails with [`SyncError::Poisoned`] if an earlier holder panicked.
    pub fn with<R>(&self, f: impl FnOnce(&mut RegionTree<'buf>) -> R) -> Result<R, SyncError> {
        let mut guard = self.inner.lock().map_err(|_| SyncError::Poisoned)?;
        Ok(f(&mut guard))
    }

    /// Give the tree back.
    pub fn into_inner(self) -> Result<RegionTree<'buf>, SyncError> {
        self.inner.into_inner().map_err(|_| SyncError::Poisoned)
    }
}
