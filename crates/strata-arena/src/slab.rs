//! Generation-checked slot storage for region nodes.
//!
//! [`RegionSlab`] owns every live region of a tree. Released slots go on a
//! free list and are reused by later spawns and pushes; each release bumps
//! the slot generation so that old [`RegionId`]s stop resolving.

use smallvec::SmallVec;

use crate::handle::RegionId;

/// How a region came into existence, which decides how it may be released.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RegionKind {
    /// Wraps the caller's buffer. Never released.
    Root,
    /// Carved permanently; reclaimed only with an ancestor.
    Spawned,
    /// Carved by `push`; released by `pop` in stack order.
    Scoped {
        parent: RegionId,
        index: usize,
    },
}

/// Bookkeeping for one region.
#[derive(Clone, Debug)]
pub(crate) struct RegionNode {
    /// Absolute offset of the region's first byte in the root buffer.
    pub(crate) start: usize,
    /// Reserved size in bytes.
    pub(crate) capacity: usize,
    /// High-water mark, relative to `start`.
    pub(crate) used: usize,
    /// Bumped on every reset; allocations remember the epoch they were made in.
    pub(crate) epoch: u32,
    pub(crate) kind: RegionKind,
    /// Open scoped children, oldest first. The last entry is the only one
    /// that may be popped.
    pub(crate) open: SmallVec<[RegionId; 4]>,
    /// Every live child carved from this region (spawned and scoped), in
    /// carve order.
    pub(crate) carved: SmallVec<[RegionId; 4]>,
}

impl RegionNode {
    pub(crate) fn new(start: usize, capacity: usize, kind: RegionKind) -> Self {
        Self {
            start,
            capacity,
            used: 0,
            epoch: 0,
            kind,
            open: SmallVec::new(),
            carved: SmallVec::new(),
        }
    }

    pub(crate) fn available(&self) -> usize {
        self.capacity - self.used
    }

    /// Absolute offset one past the high-water mark.
    pub(crate) fn top(&self) -> usize {
        self.start + self.used
    }

    /// Absolute offset one past the reserved extent.
    pub(crate) fn end(&self) -> usize {
        self.start + self.capacity
    }
}

struct Slot {
    generation: u32,
    node: Option<RegionNode>,
}

/// Slab of region nodes addressed by [`RegionId`].
pub(crate) struct RegionSlab {
    slots: Vec<Slot>,
    /// Indices of empty slots available for reuse.
    free_list: Vec<u32>,
    live: usize,
}

impl RegionSlab {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    pub(crate) fn insert(&mut self, node: RegionNode) -> RegionId {
        self.live += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return RegionId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        RegionId::new(index, 0)
    }

    pub(crate) fn get(&self, id: RegionId) -> Option<&RegionNode> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: RegionId) -> Option<&mut RegionNode> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    pub(crate) fn contains(&self, id: RegionId) -> bool {
        self.get(id).is_some()
    }

    /// Release `id` and everything carved from it, depth first.
    ///
    /// Returns the number of regions released. A stale `id` releases nothing.
    pub(crate) fn remove_subtree(&mut self, id: RegionId) -> usize {
        let mut pending = vec![id];
        let mut removed = 0;
        while let Some(next) = pending.pop() {
            let Some(node) = self.take(next) else {
                continue;
            };
            pending.extend(node.carved.iter().copied());
            removed += 1;
        }
        removed
    }

    fn take(&mut self, id: RegionId) -> Option<RegionNode> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        self.live -= 1;
        Some(node)
    }

    /// Number of live regions.
    pub(crate) fn live(&self) -> usize {
        self.live
    }
}
