//! Errors from the synchronisation primitives.

use std::error::Error;
use std::fmt;

/// Errors that can occur in semaphores, thread spawning, and shared trees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncError {
    /// A signal would push the semaphore past its maximum value.
    SemaphoreOverflow {
        /// Largest value the semaphore can hold.
        max: usize,
    },
    /// The semaphore's token channel was disconnected.
    Disconnected,
    /// A thread holding the shared tree panicked while holding the lock.
    Poisoned,
    /// The OS refused to start a thread.
    Spawn {
        /// Error reported by the OS.
        reason: String,
    },
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SemaphoreOverflow { max } => {
                write!(f, "semaphore overflow: value cannot exceed {max}")
            }
            Self::Disconnected => write!(f, "semaphore channel disconnected"),
            Self::Poisoned => write!(f, "shared region tree lock poisoned"),
            Self::Spawn { reason } => write!(f, "failed to spawn thread: {reason}"),
        }
    }
}

impl Error for SyncError {}
