//! The region tree: a root region over a caller-owned buffer plus every
//! region carved from it.
//!
//! All regions of a tree share the root buffer. A child region is a byte
//! range of its parent; allocation is a bump of the owning region's
//! high-water mark. Children come in two kinds:
//!
//! - **spawned** regions are permanent and are reclaimed only when an
//!   ancestor is reset;
//! - **scoped** regions are pushed onto their parent's open-child stack and
//!   must be popped in reverse order, which zeroes their extent and returns
//!   it to the parent.
//!
//! The tree performs no locking. Every mutating method takes `&mut self`, so
//! sharing a tree across threads requires an external mutex.

use std::fmt;

use tracing::{debug, error, trace, warn};

use crate::config::ArenaConfig;
use crate::error::{ArenaError, ProtocolViolation};
use crate::handle::{Allocation, RegionId, ScopedRegion};
use crate::slab::{RegionKind, RegionNode, RegionSlab};

/// Result of bumping a region's high-water mark.
struct Carve {
    /// Absolute offset into the root buffer.
    start: usize,
    /// Offset relative to the carving region.
    offset: usize,
    epoch: u32,
    /// Open scoped children of the carving region before this carve.
    open: usize,
}

/// A root region and all of its descendants.
///
/// # Example
///
/// ```
/// use strata_arena::RegionTree;
///
/// let mut buffer = vec![0u8; 1024];
/// let mut tree = RegionTree::init(Some(&mut buffer));
/// let root = tree.root();
///
/// let scratch = tree.push(root, 256).unwrap();
/// let tmp = tree.allocate(scratch.region(), 16).unwrap();
/// tree.bytes_mut(tmp).unwrap().fill(0xAB);
/// tree.pop(scratch).unwrap();
///
/// assert_eq!(tree.used(root).unwrap(), 0);
/// ```
pub struct RegionTree<'buf> {
    buf: &'buf mut [u8],
    slab: RegionSlab,
    root: RegionId,
    config: ArenaConfig,
    /// Built without a buffer; every carve fails.
    inert: bool,
}

impl<'buf> RegionTree<'buf> {
    /// Wrap a caller-owned buffer with the default configuration.
    ///
    /// A `None` buffer yields an inert tree whose root has capacity 0. Every
    /// request on it fails with [`ArenaError::OutOfSpace`], zero-byte
    /// allocations included.
    pub fn init(buffer: Option<&'buf mut [u8]>) -> Self {
        Self::with_config(buffer, ArenaConfig::default())
    }

    /// Wrap a caller-owned buffer.
    pub fn with_config(buffer: Option<&'buf mut [u8]>, config: ArenaConfig) -> Self {
        let inert = buffer.is_none();
        let buf: &'buf mut [u8] = buffer.unwrap_or_default();
        let mut slab = RegionSlab::new();
        let root = slab.insert(RegionNode::new(0, buf.len(), RegionKind::Root));
        debug!(capacity = buf.len(), inert, "region tree initialised");
        Self {
            buf,
            slab,
            root,
            config,
            inert,
        }
    }

    /// The root region, spanning the whole buffer.
    pub fn root(&self) -> RegionId {
        self.root
    }

    /// The configuration this tree was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Size of the root buffer in bytes.
    pub fn total_capacity(&self) -> usize {
        self.buf.len()
    }

    /// Number of live regions, the root included.
    pub fn live_regions(&self) -> usize {
        self.slab.live()
    }

    /// Whether `region` still names a live region.
    pub fn is_live(&self, region: RegionId) -> bool {
        self.slab.contains(region)
    }

    // ── Allocation ──────────────────────────────────────────────

    /// Bump-allocate `n` bytes from `region`.
    ///
    /// Fails with [`ArenaError::OutOfSpace`] when fewer than `n` bytes
    /// remain; the region is untouched in that case. Successive allocations
    /// from one region never overlap and have increasing offsets.
    pub fn allocate(&mut self, region: RegionId, n: usize) -> Result<Allocation, ArenaError> {
        let carve = self.carve(region, n).map_err(|e| self.report(e))?;
        if self.config.zero_on_allocate {
            self.buf[carve.start..carve.start + n].fill(0);
        }
        trace!(%region, offset = carve.offset, len = n, "allocate");
        Ok(Allocation {
            region,
            epoch: carve.epoch,
            start: carve.start,
            offset: carve.offset,
            len: n,
        })
    }

    /// Allocate room for `count` elements of `elem_size` bytes each.
    ///
    /// A byte count that overflows `usize` is reported as
    /// [`ArenaError::OutOfSpace`] with `requested == usize::MAX`.
    pub fn allocate_array(
        &mut self,
        region: RegionId,
        count: usize,
        elem_size: usize,
    ) -> Result<Allocation, ArenaError> {
        let Some(n) = count.checked_mul(elem_size) else {
            let available = self.available(region)?;
            return Err(self.report(ArenaError::OutOfSpace {
                requested: usize::MAX,
                available,
            }));
        };
        self.allocate(region, n)
    }

    /// Permanently carve a `size`-byte child region out of `parent`.
    ///
    /// The child has no release path of its own. It is reclaimed when
    /// `parent` (or any ancestor) is reset. A zero `size` is rejected with
    /// [`ArenaError::ZeroSizedRegion`].
    pub fn spawn(&mut self, parent: RegionId, size: usize) -> Result<RegionId, ArenaError> {
        if size == 0 {
            return Err(self.report(ArenaError::ZeroSizedRegion));
        }
        let carve = self.carve(parent, size).map_err(|e| self.report(e))?;
        let child = self
            .slab
            .insert(RegionNode::new(carve.start, size, RegionKind::Spawned));
        if let Some(node) = self.slab.get_mut(parent) {
            node.carved.push(child);
        }
        debug!(%parent, %child, size, offset = carve.offset, "spawn");
        Ok(child)
    }

    /// Carve a `size`-byte scoped child out of `parent`.
    ///
    /// The child becomes the top of `parent`'s open-child stack. Its
    /// [`ScopedRegion::index`] is the number of children that were open
    /// before this push. A zero `size` is rejected with
    /// [`ArenaError::ZeroSizedRegion`].
    pub fn push(&mut self, parent: RegionId, size: usize) -> Result<ScopedRegion, ArenaError> {
        if size == 0 {
            return Err(self.report(ArenaError::ZeroSizedRegion));
        }
        let carve = self.carve(parent, size).map_err(|e| self.report(e))?;
        let index = carve.open;
        let region = self.slab.insert(RegionNode::new(
            carve.start,
            size,
            RegionKind::Scoped { parent, index },
        ));
        if let Some(node) = self.slab.get_mut(parent) {
            node.open.push(region);
            node.carved.push(region);
        }
        debug!(%parent, %region, index, size, offset = carve.offset, "push");
        Ok(ScopedRegion {
            region,
            parent,
            index,
        })
    }

    /// Release a scoped region back to its parent.
    ///
    /// The region must be its parent's most recently pushed open child,
    /// must have no open children of its own, and its parent must not have
    /// carved anything after it. On success the full reserved extent is
    /// zeroed, the parent's high-water mark drops by the extent's size, and
    /// the handle (with every region carved inside it) goes stale.
    ///
    /// A rejected pop changes nothing. Note that a scoped region rejected
    /// with [`ProtocolViolation::ExtentNotOnTop`] can never be popped, and
    /// its parent can then never be reset either, since
    /// [`validate`](Self::validate) keeps seeing the open child. Carve
    /// permanent data from the parent before pushing scratch frames onto it.
    pub fn pop(&mut self, scoped: ScopedRegion) -> Result<(), ArenaError> {
        let (start, end) = self.check_pop(&scoped).map_err(|e| self.report(e))?;
        let size = end - start;
        self.buf[start..end].fill(0);
        if let Some(parent) = self.slab.get_mut(scoped.parent) {
            parent.used -= size;
            parent.open.pop();
            parent.carved.retain(|c| *c != scoped.region);
        }
        let released = self.slab.remove_subtree(scoped.region);
        debug!(
            region = %scoped.region,
            parent = %scoped.parent,
            index = scoped.index,
            size,
            released,
            "pop"
        );
        Ok(())
    }

    fn check_pop(&self, scoped: &ScopedRegion) -> Result<(usize, usize), ArenaError> {
        let child = self
            .slab
            .get(scoped.region)
            .ok_or(ProtocolViolation::StaleRegion {
                region: scoped.region,
            })?;
        match child.kind {
            RegionKind::Scoped { parent, index }
                if parent == scoped.parent && index == scoped.index => {}
            _ => {
                return Err(ProtocolViolation::NotScoped {
                    region: scoped.region,
                }
                .into())
            }
        }
        let parent = self
            .slab
            .get(scoped.parent)
            .ok_or(ProtocolViolation::StaleRegion {
                region: scoped.parent,
            })?;
        if parent.open.last() != Some(&scoped.region) {
            return Err(ProtocolViolation::NotTopmost {
                index: scoped.index,
                open: parent.open.len(),
            }
            .into());
        }
        if !child.open.is_empty() {
            return Err(ProtocolViolation::OpenChildren {
                region: scoped.region,
                open: child.open.len(),
            }
            .into());
        }
        if child.end() != parent.top() {
            return Err(ProtocolViolation::ExtentNotOnTop {
                region: scoped.region,
            }
            .into());
        }
        Ok((child.start, child.end()))
    }

    /// Check that `region` has no open scoped children.
    pub fn validate(&self, region: RegionId) -> Result<(), ArenaError> {
        let node = self.node(region)?;
        if !node.open.is_empty() {
            return Err(self.report(
                ProtocolViolation::OpenChildren {
                    region,
                    open: node.open.len(),
                }
                .into(),
            ));
        }
        Ok(())
    }

    /// Zero `[0, used)` of `region` and rewind it to empty.
    ///
    /// Calls [`validate`](Self::validate) first: a region with open scoped
    /// children cannot be reset. Spawned descendants are reclaimed and their
    /// handles go stale; earlier allocations from `region` go stale too.
    pub fn reset(&mut self, region: RegionId) -> Result<(), ArenaError> {
        self.validate(region)?;
        let cleared = self.slab.get_mut(region).map(|node| {
            let extent = (node.start, node.top());
            node.used = 0;
            node.epoch = node.epoch.wrapping_add(1);
            (extent, std::mem::take(&mut node.carved))
        });
        let Some(((start, top), carved)) = cleared else {
            return Err(self.report(ProtocolViolation::StaleRegion { region }.into()));
        };
        self.buf[start..top].fill(0);
        let released: usize = carved
            .into_iter()
            .map(|child| self.slab.remove_subtree(child))
            .sum();
        debug!(%region, cleared = top - start, released, "reset");
        Ok(())
    }

    // ── Inspection ──────────────────────────────────────────────

    /// Bytes carved from `region` so far.
    pub fn used(&self, region: RegionId) -> Result<usize, ArenaError> {
        self.node(region).map(|n| n.used)
    }

    /// Reserved size of `region` in bytes.
    pub fn capacity(&self, region: RegionId) -> Result<usize, ArenaError> {
        self.node(region).map(|n| n.capacity)
    }

    /// Bytes still available in `region`.
    pub fn available(&self, region: RegionId) -> Result<usize, ArenaError> {
        self.node(region).map(RegionNode::available)
    }

    /// Number of scoped children of `region` that have not been popped.
    pub fn open_children(&self, region: RegionId) -> Result<usize, ArenaError> {
        self.node(region).map(|n| n.open.len())
    }

    /// The bytes of a live allocation.
    pub fn bytes(&self, allocation: Allocation) -> Result<&[u8], ArenaError> {
        self.check_allocation(&allocation)?;
        Ok(&self.buf[allocation.start..allocation.start + allocation.len])
    }

    /// The bytes of a live allocation, writable.
    pub fn bytes_mut(&mut self, allocation: Allocation) -> Result<&mut [u8], ArenaError> {
        self.check_allocation(&allocation)?;
        Ok(&mut self.buf[allocation.start..allocation.start + allocation.len])
    }

    /// The whole reserved extent of `region`, used or not.
    pub fn region_bytes(&self, region: RegionId) -> Result<&[u8], ArenaError> {
        let (start, end) = self.node(region).map(|n| (n.start, n.end()))?;
        Ok(&self.buf[start..end])
    }

    /// The whole reserved extent of `region`, writable.
    pub fn region_bytes_mut(&mut self, region: RegionId) -> Result<&mut [u8], ArenaError> {
        let (start, end) = self.node(region).map(|n| (n.start, n.end()))?;
        Ok(&mut self.buf[start..end])
    }

    // ── Internals ───────────────────────────────────────────────

    fn carve(&mut self, region: RegionId, n: usize) -> Result<Carve, ArenaError> {
        let node = self
            .slab
            .get_mut(region)
            .ok_or(ProtocolViolation::StaleRegion { region })?;
        if self.inert {
            return Err(ArenaError::OutOfSpace {
                requested: n,
                available: 0,
            });
        }
        let available = node.available();
        if n > available {
            return Err(ArenaError::OutOfSpace {
                requested: n,
                available,
            });
        }
        let carve = Carve {
            start: node.top(),
            offset: node.used,
            epoch: node.epoch,
            open: node.open.len(),
        };
        node.used += n;
        Ok(carve)
    }

    fn node(&self, region: RegionId) -> Result<&RegionNode, ArenaError> {
        self.slab
            .get(region)
            .ok_or_else(|| self.report(ProtocolViolation::StaleRegion { region }.into()))
    }

    fn check_allocation(&self, allocation: &Allocation) -> Result<(), ArenaError> {
        let node = self.node(allocation.region)?;
        if node.epoch != allocation.epoch {
            return Err(self.report(
                ProtocolViolation::StaleAllocation {
                    region: allocation.region,
                }
                .into(),
            ));
        }
        Ok(())
    }

    /// Log `err` and escalate it according to the violation policy.
    pub(crate) fn report(&self, err: ArenaError) -> ArenaError {
        if err.is_fatal() {
            error!(error = %err, "region contract violation");
            if self.config.panics_on_violation() {
                panic!("region contract violation: {err}");
            }
        } else {
            warn!(error = %err, "region request refused");
        }
        err
    }
}

impl fmt::Debug for RegionTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionTree")
            .field("capacity", &self.buf.len())
            .field("root", &self.root)
            .field("live_regions", &self.slab.live())
            .field("inert", &self.inert)
            .field("config", &self.config)
            .finish()
    }
}
