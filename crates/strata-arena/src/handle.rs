//! Region, scoped-region, and allocation handles.
//!
//! Handles are plain `Copy` values. They carry a slot generation (regions)
//! or a region epoch (allocations) so that a handle outliving the memory it
//! names is detected in O(1) instead of aliasing whatever reuses the slot.

use std::fmt;

/// Identifies a live region inside a [`RegionTree`](crate::tree::RegionTree).
///
/// Region slots are recycled; `generation` distinguishes the current
/// occupant of a slot from earlier, released ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl RegionId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index within the tree.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Capability for a region created by [`RegionTree::push`].
///
/// Valid until passed to [`RegionTree::pop`]; afterwards every use is
/// rejected as a stale region.
///
/// [`RegionTree::push`]: crate::tree::RegionTree::push
/// [`RegionTree::pop`]: crate::tree::RegionTree::pop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use = "a scoped region must be popped to return its bytes to the parent"]
pub struct ScopedRegion {
    pub(crate) region: RegionId,
    pub(crate) parent: RegionId,
    pub(crate) index: usize,
}

impl ScopedRegion {
    /// The child region; allocate from it like any other region.
    pub fn region(&self) -> RegionId {
        self.region
    }

    /// The region this one was pushed onto.
    pub fn parent(&self) -> RegionId {
        self.parent
    }

    /// Position in the parent's open-child stack (0 = oldest).
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for ScopedRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ScopedRegion({} under {}, child {})",
            self.region, self.parent, self.index
        )
    }
}

/// A byte range handed out by [`RegionTree::allocate`](crate::tree::RegionTree::allocate).
///
/// Resolve it with [`RegionTree::bytes`](crate::tree::RegionTree::bytes) or
/// [`RegionTree::bytes_mut`](crate::tree::RegionTree::bytes_mut).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Allocation {
    pub(crate) region: RegionId,
    /// Region epoch at allocation time; bumped by `reset`.
    pub(crate) epoch: u32,
    /// Absolute offset into the root buffer.
    pub(crate) start: usize,
    /// Offset from the start of the owning region.
    pub(crate) offset: usize,
    pub(crate) len: usize,
}

impl Allocation {
    /// The region this allocation was carved from.
    pub fn region(&self) -> RegionId {
        self.region
    }

    /// Offset of the first byte, relative to the start of the region.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// One past the last byte, relative to the start of the region.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether this is a zero-length allocation.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Allocation(region={}, off={}, len={})",
            self.region, self.offset, self.len
        )
    }
}
