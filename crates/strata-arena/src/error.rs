//! Arena error types.
//!
//! Errors fall into two classes. [`ArenaError::OutOfSpace`] is recoverable:
//! the request did not fit and nothing was mutated. Every other variant is a
//! broken contract on the caller's side (see [`ArenaError::is_fatal`]) and is
//! escalated according to the tree's
//! [`ViolationPolicy`](crate::config::ViolationPolicy).

use std::error::Error;
use std::fmt;

use crate::handle::RegionId;

/// Errors that can occur during region and stack operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The region does not have enough unused bytes for the request.
    OutOfSpace {
        /// Number of bytes requested.
        requested: usize,
        /// Bytes remaining in the region at the time of the request.
        available: usize,
    },
    /// A push onto a fixed-capacity stack that is already full.
    CapacityExceeded {
        /// Fixed element capacity of the stack.
        capacity: usize,
    },
    /// An element whose byte width does not match the stack's element size.
    ElementSize {
        /// Element size the stack was created with.
        expected: usize,
        /// Byte width of the element that was supplied.
        actual: usize,
    },
    /// A stack was requested with a zero-byte element size.
    ZeroSizedElement,
    /// `spawn` or `push` asked for a zero-byte region.
    ZeroSizedRegion,
    /// The caller broke the region protocol.
    Protocol(ProtocolViolation),
}

impl ArenaError {
    /// Whether this error marks a programming defect rather than exhaustion.
    ///
    /// Only [`ArenaError::OutOfSpace`] is recoverable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::OutOfSpace { .. })
    }
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfSpace {
                requested,
                available,
            } => {
                write!(
                    f,
                    "region out of space: requested {requested} bytes, {available} bytes available"
                )
            }
            Self::CapacityExceeded { capacity } => {
                write!(f, "stack capacity exceeded: capacity is {capacity} elements")
            }
            Self::ElementSize { expected, actual } => {
                write!(
                    f,
                    "element size mismatch: stack holds {expected}-byte elements, got {actual} bytes"
                )
            }
            Self::ZeroSizedElement => write!(f, "stack element size must be non-zero"),
            Self::ZeroSizedRegion => write!(f, "child region size must be non-zero"),
            Self::Protocol(violation) => write!(f, "region protocol violation: {violation}"),
        }
    }
}

impl Error for ArenaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Protocol(violation) => Some(violation),
            _ => None,
        }
    }
}

impl From<ProtocolViolation> for ArenaError {
    fn from(v: ProtocolViolation) -> Self {
        Self::Protocol(v)
    }
}

/// Ways a caller can break the region protocol.
///
/// None of these are transient. The operation that detected the violation
/// leaves every region untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// `pop` on a scoped region that is not its parent's most recent open child.
    NotTopmost {
        /// Child index recorded in the handle.
        index: usize,
        /// Number of children the parent currently has open.
        open: usize,
    },
    /// `reset` or `pop` on a region that still has open scoped children.
    OpenChildren {
        /// The region that was asked to release memory.
        region: RegionId,
        /// Number of children still open.
        open: usize,
    },
    /// `pop` on a scoped region whose parent carved more memory after it.
    ExtentNotOnTop {
        /// The scoped region being popped.
        region: RegionId,
    },
    /// The handle names a region that was popped or reclaimed by an ancestor reset.
    StaleRegion {
        /// The dead region.
        region: RegionId,
    },
    /// The allocation's region has been reset since the allocation was made.
    StaleAllocation {
        /// The region the allocation was carved from.
        region: RegionId,
    },
    /// The handle names a region that was not created by `push`.
    NotScoped {
        /// The offending region.
        region: RegionId,
    },
    /// A stack header no longer matches its handle.
    HeaderCorrupt {
        /// The stack's backing region.
        region: RegionId,
    },
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotTopmost { index, open } => {
                write!(
                    f,
                    "scoped region {index} is not the topmost child ({open} open)"
                )
            }
            Self::OpenChildren { region, open } => {
                write!(f, "region {region} still has {open} open scoped children")
            }
            Self::ExtentNotOnTop { region } => {
                write!(
                    f,
                    "scoped region {region} is not at its parent's high-water mark"
                )
            }
            Self::StaleRegion { region } => write!(f, "region {region} is no longer live"),
            Self::StaleAllocation { region } => {
                write!(f, "allocation predates the last reset of region {region}")
            }
            Self::NotScoped { region } => write!(f, "region {region} was not pushed"),
            Self::HeaderCorrupt { region } => {
                write!(f, "stack header in region {region} was overwritten")
            }
        }
    }
}

impl Error for ProtocolViolation {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_out_of_space_is_recoverable() {
        let oos = ArenaError::OutOfSpace {
            requested: 10,
            available: 4,
        };
        assert!(!oos.is_fatal());
        assert!(ArenaError::CapacityExceeded { capacity: 3 }.is_fatal());
        assert!(ArenaError::ZeroSizedRegion.is_fatal());
        assert!(ArenaError::from(ProtocolViolation::NotTopmost { index: 0, open: 2 }).is_fatal());
    }

    #[test]
    fn display_names_the_numbers() {
        let err = ArenaError::OutOfSpace {
            requested: 128,
            available: 64,
        };
        assert_eq!(
            err.to_string(),
            "region out of space: requested 128 bytes, 64 bytes available"
        );
    }

    #[test]
    fn protocol_source_is_the_violation() {
        let err = ArenaError::from(ProtocolViolation::NotTopmost { index: 1, open: 3 });
        assert!(err.source().is_some());
    }
}
