//! Counting semaphore backed by a bounded token channel.
//!
//! Each unit of the semaphore's value is one `()` token sitting in a
//! `crossbeam_channel::bounded` queue. `signal` enqueues a token, `wait`
//! dequeues one (blocking while empty). The channel's bound is the
//! semaphore's maximum value.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::error::SyncError;

/// Largest value a [`Semaphore`] can hold.
pub const MAX_SEMAPHORE_VALUE: usize = 1 << 16;

/// A counting semaphore.
///
/// Cloning is cheap and yields another handle to the same semaphore.
#[derive(Clone, Debug)]
pub struct Semaphore {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl Semaphore {
    /// Create a semaphore holding `initial` units.
    pub fn new(initial: usize) -> Result<Self, SyncError> {
        if initial > MAX_SEMAPHORE_VALUE {
            return Err(SyncError::SemaphoreOverflow {
                max: MAX_SEMAPHORE_VALUE,
            });
        }
        let (tx, rx) = crossbeam_channel::bounded(MAX_SEMAPHORE_VALUE);
        let sem = Self { tx, rx };
        for _ in 0..initial {
            sem.signal()?;
        }
        Ok(sem)
    }

    /// Add one unit, waking a blocked waiter if there is one.
    pub fn signal(&self) -> Result<(), SyncError> {
        self.tx.try_send(()).map_err(|e| match e {
            TrySendError::Full(()) => SyncError::SemaphoreOverflow {
                max: MAX_SEMAPHORE_VALUE,
            },
            TrySendError::Disconnected(()) => SyncError::Disconnected,
        })
    }

    /// Take one unit, blocking until one is available.
    pub fn wait(&self) -> Result<(), SyncError> {
        self.rx.recv().map_err(|_| SyncError::Disconnected)
    }

    /// Take one unit if available without blocking.
    pub fn try_wait(&self) -> bool {
        self.rx.try_recv().is_ok()
    }

    /// Take one unit, giving up after `timeout`. Returns whether a unit was taken.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<bool, SyncError> {
        match self.rx.recv_timeout(timeout) {
            Ok(()) => Ok(true),
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(RecvTimeoutError::Disconnected) => Err(SyncError::Disconnected),
        }
    }

    /// Current value. Racy under contention; for diagnostics only.
    pub fn value(&self) -> usize {
        self.rx.len()
    }
}
