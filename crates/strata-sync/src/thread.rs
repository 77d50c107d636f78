//! Fire-and-forget threads and CPU discovery.

use std::num::NonZeroUsize;
use std::thread;

use tracing::debug;

use crate::error::SyncError;

/// Number of logical CPUs available to this process (at least 1).
pub fn cpu_count() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Start a named thread running `f` and detach it.
///
/// The thread cannot be joined; pair it with a
/// [`Semaphore`](crate::Semaphore) or a channel to learn when it finishes.
pub fn spawn_detached<F>(name: impl Into<String>, f: F) -> Result<(), SyncError>
where
    F: FnOnce() + Send + 'static,
{
    let name = name.into();
    debug!(thread = %name, "spawning detached thread");
    thread::Builder::new()
        .name(name)
        .spawn(f)
        .map(drop)
        .map_err(|e| SyncError::Spawn {
            reason: e.to_string(),
        })
}
