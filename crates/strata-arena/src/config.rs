//! Region tree configuration parameters.

/// How a [`RegionTree`](crate::tree::RegionTree) escalates fatal errors.
///
/// Fatal errors are protocol violations and stack capacity overruns
/// (see [`ArenaError::is_fatal`](crate::error::ArenaError::is_fatal)).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViolationPolicy {
    /// Log at `error` level and return the error to the caller.
    #[default]
    Report,
    /// Log at `error` level, then panic.
    Panic,
}

/// Configuration for a region tree.
///
/// Immutable once the tree is built.
#[derive(Clone, Debug, Default)]
pub struct ArenaConfig {
    /// Escalation for fatal errors.
    pub violation_policy: ViolationPolicy,

    /// Zero every allocation before handing it out.
    ///
    /// Memory released by `pop` and `reset` is always zeroed, and the root
    /// buffer is the caller's. Set this when the caller cannot vouch for the
    /// buffer's initial contents.
    pub zero_on_allocate: bool,
}

impl ArenaConfig {
    /// Default configuration: report violations, no zeroing on allocate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Same configuration with the given violation policy.
    pub fn with_violation_policy(mut self, policy: ViolationPolicy) -> Self {
        self.violation_policy = policy;
        self
    }

    /// Same configuration with zero-on-allocate switched on or off.
    pub fn with_zero_on_allocate(mut self, zero: bool) -> Self {
        self.zero_on_allocate = zero;
        self
    }

    /// Whether fatal errors panic.
    pub fn panics_on_violation(&self) -> bool {
        self.violation_policy == ViolationPolicy::Panic
    }
}
