//! Fixed-capacity stacks stored inside spawned regions.
//!
//! A stack is a permanently spawned region laid out as a 16-byte
//! [`StackHeader`] followed by `capacity` element slots. The handle
//! ([`RawStack`] or the typed [`Stack<T>`]) remembers the backing region and
//! the element geometry; the live count lives in the header so any copy of
//! the handle observes the same state.
//!
//! Capacity is fixed at creation and never grows. Pushing onto a full stack
//! is [`ArenaError::CapacityExceeded`], a fatal error: growing in place is
//! impossible and moving the payload would break outstanding readers.

use std::fmt;
use std::marker::PhantomData;

use smallvec::{smallvec, SmallVec};
use tracing::{debug, trace};

use crate::element::Element;
use crate::error::{ArenaError, ProtocolViolation};
use crate::handle::RegionId;
use crate::tree::RegionTree;

/// Size of the encoded [`StackHeader`] in bytes.
pub const HEADER_SIZE: usize = 16;

/// Header stored at the start of a stack's region: two little-endian `u64`s.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackHeader {
    /// Element capacity, fixed at creation.
    pub capacity: u64,
    /// Live element count, `<= capacity`.
    pub count: u64,
}

impl StackHeader {
    fn encode(&self, out: &mut [u8]) {
        self.capacity.write_to(&mut out[..8]);
        self.count.write_to(&mut out[8..HEADER_SIZE]);
    }

    fn decode(bytes: &[u8]) -> Self {
        Self {
            capacity: u64::read_from(&bytes[..8]),
            count: u64::read_from(&bytes[8..HEADER_SIZE]),
        }
    }
}

/// Untyped fixed-capacity stack of `element_size`-byte slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawStack {
    region: RegionId,
    capacity: usize,
    element_size: usize,
}

impl RawStack {
    /// Spawn a region of `HEADER_SIZE + capacity * element_size` bytes from
    /// `parent` and write an empty header into it.
    pub fn create(
        tree: &mut RegionTree<'_>,
        parent: RegionId,
        capacity: usize,
        element_size: usize,
    ) -> Result<Self, ArenaError> {
        if element_size == 0 {
            return Err(tree.report(ArenaError::ZeroSizedElement));
        }
        let size = capacity
            .checked_mul(element_size)
            .and_then(|payload| payload.checked_add(HEADER_SIZE));
        let Some(size) = size else {
            let available = tree.available(parent)?;
            return Err(tree.report(ArenaError::OutOfSpace {
                requested: usize::MAX,
                available,
            }));
        };
        let region = tree.spawn(parent, size)?;
        let header = StackHeader {
            capacity: capacity as u64,
            count: 0,
        };
        header.encode(&mut tree.region_bytes_mut(region)?[..HEADER_SIZE]);
        debug!(%parent, %region, capacity, element_size, "stack created");
        Ok(Self {
            region,
            capacity,
            element_size,
        })
    }

    /// The spawned region backing this stack.
    pub fn region(&self) -> RegionId {
        self.region
    }

    /// Fixed element capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Width of one element slot in bytes.
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// Current element count, read from the header.
    pub fn count(&self, tree: &RegionTree<'_>) -> Result<usize, ArenaError> {
        self.header(tree).map(|h| h.count as usize)
    }

    /// Whether the stack holds no elements.
    pub fn is_empty(&self, tree: &RegionTree<'_>) -> Result<bool, ArenaError> {
        self.count(tree).map(|c| c == 0)
    }

    /// Whether another push would exceed capacity.
    pub fn is_full(&self, tree: &RegionTree<'_>) -> Result<bool, ArenaError> {
        self.count(tree).map(|c| c == self.capacity)
    }

    /// Copy `element` into the next free slot.
    ///
    /// `element` must be exactly `element_size` bytes. A full stack is left
    /// untouched and the push fails with [`ArenaError::CapacityExceeded`].
    pub fn push(&self, tree: &mut RegionTree<'_>, element: &[u8]) -> Result<(), ArenaError> {
        if element.len() != self.element_size {
            return Err(tree.report(ArenaError::ElementSize {
                expected: self.element_size,
                actual: element.len(),
            }));
        }
        let header = self.header(tree)?;
        let count = header.count as usize;
        if count >= self.capacity {
            return Err(tree.report(ArenaError::CapacityExceeded {
                capacity: self.capacity,
            }));
        }
        let slot = HEADER_SIZE + count * self.element_size;
        let bytes = tree.region_bytes_mut(self.region)?;
        bytes[slot..slot + self.element_size].copy_from_slice(element);
        StackHeader {
            count: header.count + 1,
            ..header
        }
        .encode(&mut bytes[..HEADER_SIZE]);
        trace!(region = %self.region, count = count + 1, "stack push");
        Ok(())
    }

    /// The element at `index`, or `None` past the live count.
    pub fn get<'t>(
        &self,
        tree: &'t RegionTree<'_>,
        index: usize,
    ) -> Result<Option<&'t [u8]>, ArenaError> {
        let count = self.count(tree)?;
        if index >= count {
            return Ok(None);
        }
        let slot = HEADER_SIZE + index * self.element_size;
        let bytes = tree.region_bytes(self.region)?;
        Ok(Some(&bytes[slot..slot + self.element_size]))
    }

    /// The most recently pushed element.
    pub fn last<'t>(&self, tree: &'t RegionTree<'_>) -> Result<Option<&'t [u8]>, ArenaError> {
        match self.count(tree)? {
            0 => Ok(None),
            n => self.get(tree, n - 1),
        }
    }

    /// Drop the most recently pushed element and return its bytes.
    ///
    /// The slot is not zeroed; its bytes stay until the next push overwrites
    /// them.
    pub fn pop<'t>(&self, tree: &'t mut RegionTree<'_>) -> Result<Option<&'t [u8]>, ArenaError> {
        let header = self.header(tree)?;
        if header.count == 0 {
            return Ok(None);
        }
        let index = header.count as usize - 1;
        self.write_count(tree, header.count - 1)?;
        let tree: &'t RegionTree<'_> = tree;
        let slot = HEADER_SIZE + index * self.element_size;
        let bytes = tree.region_bytes(self.region)?;
        Ok(Some(&bytes[slot..slot + self.element_size]))
    }

    /// Set the count to zero. Payload bytes are left as they are.
    pub fn reset(&self, tree: &mut RegionTree<'_>) -> Result<(), ArenaError> {
        self.header(tree)?;
        self.write_count(tree, 0)?;
        debug!(region = %self.region, "stack reset");
        Ok(())
    }

    /// Iterate over the live elements, oldest first.
    pub fn iter<'t>(
        &self,
        tree: &'t RegionTree<'_>,
    ) -> Result<std::slice::ChunksExact<'t, u8>, ArenaError> {
        let count = self.count(tree)?;
        let bytes = tree.region_bytes(self.region)?;
        let end = HEADER_SIZE + count * self.element_size;
        Ok(bytes[HEADER_SIZE..end].chunks_exact(self.element_size))
    }

    fn header(&self, tree: &RegionTree<'_>) -> Result<StackHeader, ArenaError> {
        let bytes = tree.region_bytes(self.region)?;
        let header = StackHeader::decode(&bytes[..HEADER_SIZE]);
        if header.capacity != self.capacity as u64 || header.count > header.capacity {
            return Err(tree.report(
                ProtocolViolation::HeaderCorrupt {
                    region: self.region,
                }
                .into(),
            ));
        }
        Ok(header)
    }

    fn write_count(&self, tree: &mut RegionTree<'_>, count: u64) -> Result<(), ArenaError> {
        let bytes = tree.region_bytes_mut(self.region)?;
        count.write_to(&mut bytes[8..HEADER_SIZE]);
        Ok(())
    }
}

/// Typed fixed-capacity stack of [`Element`]s.
///
/// # Example
///
/// ```
/// use strata_arena::{RegionTree, Stack};
///
/// let mut buffer = vec![0u8; 256];
/// let mut tree = RegionTree::init(Some(&mut buffer));
/// let root = tree.root();
///
/// let stack = Stack::<i32>::create(&mut tree, root, 4).unwrap();
/// stack.push(&mut tree, 7).unwrap();
/// stack.push(&mut tree, 9).unwrap();
/// assert_eq!(stack.count(&tree).unwrap(), 2);
/// assert_eq!(stack.get(&tree, 1).unwrap(), Some(9));
/// ```
pub struct Stack<T: Element> {
    raw: RawStack,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Element> Stack<T> {
    /// Spawn a stack with room for `capacity` elements of `T` from `parent`.
    pub fn create(
        tree: &mut RegionTree<'_>,
        parent: RegionId,
        capacity: usize,
    ) -> Result<Self, ArenaError> {
        RawStack::create(tree, parent, capacity, T::SIZE).map(Self::from_raw)
    }

    fn from_raw(raw: RawStack) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// The untyped view of this stack.
    pub fn as_raw(&self) -> &RawStack {
        &self.raw
    }

    /// The spawned region backing this stack.
    pub fn region(&self) -> RegionId {
        self.raw.region()
    }

    /// Fixed element capacity.
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Current element count.
    pub fn count(&self, tree: &RegionTree<'_>) -> Result<usize, ArenaError> {
        self.raw.count(tree)
    }

    /// Whether the stack holds no elements.
    pub fn is_empty(&self, tree: &RegionTree<'_>) -> Result<bool, ArenaError> {
        self.raw.is_empty(tree)
    }

    /// Whether another push would exceed capacity.
    pub fn is_full(&self, tree: &RegionTree<'_>) -> Result<bool, ArenaError> {
        self.raw.is_full(tree)
    }

    /// Append `value`; fails with [`ArenaError::CapacityExceeded`] when full.
    pub fn push(&self, tree: &mut RegionTree<'_>, value: T) -> Result<(), ArenaError> {
        let mut slot: SmallVec<[u8; 16]> = smallvec![0; T::SIZE];
        value.write_to(&mut slot);
        self.raw.push(tree, &slot)
    }

    /// The element at `index`, or `None` past the live count.
    pub fn get(&self, tree: &RegionTree<'_>, index: usize) -> Result<Option<T>, ArenaError> {
        Ok(self.raw.get(tree, index)?.map(T::read_from))
    }

    /// The most recently pushed element.
    pub fn last(&self, tree: &RegionTree<'_>) -> Result<Option<T>, ArenaError> {
        Ok(self.raw.last(tree)?.map(T::read_from))
    }

    /// Remove and return the most recently pushed element.
    pub fn pop(&self, tree: &mut RegionTree<'_>) -> Result<Option<T>, ArenaError> {
        Ok(self.raw.pop(tree)?.map(T::read_from))
    }

    /// Set the count to zero without clearing the payload.
    pub fn reset(&self, tree: &mut RegionTree<'_>) -> Result<(), ArenaError> {
        self.raw.reset(tree)
    }

    /// Iterate over the live elements, oldest first.
    pub fn iter<'t>(
        &self,
        tree: &'t RegionTree<'_>,
    ) -> Result<impl Iterator<Item = T> + 't, ArenaError>
    where
        T: 't,
    {
        Ok(self.raw.iter(tree)?.map(T::read_from))
    }

    /// Copy the live elements out.
    pub fn to_vec(&self, tree: &RegionTree<'_>) -> Result<Vec<T>, ArenaError> {
        Ok(self.iter(tree)?.collect())
    }
}

impl<T: Element> Clone for Stack<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Element> Copy for Stack<T> {}

impl<T: Element> fmt::Debug for Stack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("element", &std::any::type_name::<T>())
            .field("raw", &self.raw)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_reserves_header_plus_payload() {
        let mut buf = vec![0u8; 256];
        let mut tree = RegionTree::init(Some(&mut buf));
        let root = tree.root();
        let stack = RawStack::create(&mut tree, root, 10, 4).unwrap();
        assert_eq!(tree.used(root).unwrap(), HEADER_SIZE + 40);
        assert_eq!(tree.capacity(stack.region()).unwrap(), HEADER_SIZE + 40);
        assert_eq!(stack.count(&tree).unwrap(), 0);
        assert_eq!(tree.open_children(root).unwrap(), 0);
    }

    #[test]
    fn header_precedes_payload() {
        let mut buf = vec![0u8; 64];
        let mut tree = RegionTree::init(Some(&mut buf));
        let root = tree.root();
        let stack = Stack::<u16>::create(&mut tree, root, 3).unwrap();
        stack.push(&mut tree, 0xBEEF).unwrap();

        let bytes = tree.region_bytes(stack.region()).unwrap();
        let header = StackHeader::decode(&bytes[..HEADER_SIZE]);
        assert_eq!(
            header,
            StackHeader {
                capacity: 3,
                count: 1
            }
        );
        assert_eq!(&bytes[HEADER_SIZE..HEADER_SIZE + 2], &[0xEF, 0xBE]);
    }

    #[test]
    fn ten_pushes_fit_and_eleventh_fails() {
        let mut buf = vec![0u8; 256];
        let mut tree = RegionTree::init(Some(&mut buf));
        let root = tree.root();
        let stack = Stack::<u32>::create(&mut tree, root, 10).unwrap();
        for i in 0..10 {
            stack.push(&mut tree, i).unwrap();
        }
        assert_eq!(stack.count(&tree).unwrap(), 10);
        assert!(stack.is_full(&tree).unwrap());

        assert_eq!(
            stack.push(&mut tree, 10),
            Err(ArenaError::CapacityExceeded { capacity: 10 })
        );
        assert_eq!(stack.count(&tree).unwrap(), 10);
        assert_eq!(stack.to_vec(&tree).unwrap(), (0..10).collect::<Vec<u32>>());
    }

    #[test]
    fn overflowing_push_never_writes_past_the_stack() {
        let mut buf = vec![0u8; 128];
        let mut tree = RegionTree::init(Some(&mut buf));
        let root = tree.root();
        let stack = Stack::<u8>::create(&mut tree, root, 2).unwrap();
        let sentinel = tree.allocate(root, 8).unwrap();
        tree.bytes_mut(sentinel).unwrap().fill(0xAA);

        stack.push(&mut tree, 1).unwrap();
        stack.push(&mut tree, 2).unwrap();
        assert!(stack.push(&mut tree, 3).is_err());
        assert!(tree.bytes(sentinel).unwrap().iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn reset_keeps_stale_payload() {
        let mut buf = vec![0u8; 64];
        let mut tree = RegionTree::init(Some(&mut buf));
        let root = tree.root();
        let stack = Stack::<i32>::create(&mut tree, root, 4).unwrap();
        stack.push(&mut tree, 11).unwrap();
        stack.push(&mut tree, 22).unwrap();

        stack.reset(&mut tree).unwrap();
        assert_eq!(stack.count(&tree).unwrap(), 0);
        assert_eq!(stack.get(&tree, 0).unwrap(), None);

        let bytes = tree.region_bytes(stack.region()).unwrap();
        assert_eq!(i32::read_from(&bytes[HEADER_SIZE..HEADER_SIZE + 4]), 11);
        assert_eq!(
            i32::read_from(&bytes[HEADER_SIZE + 4..HEADER_SIZE + 8]),
            22
        );

        stack.push(&mut tree, 33).unwrap();
        assert_eq!(stack.to_vec(&tree).unwrap(), vec![33]);
    }

    #[test]
    fn pop_and_last() {
        let mut buf = vec![0u8; 64];
        let mut tree = RegionTree::init(Some(&mut buf));
        let root = tree.root();
        let stack = Stack::<f32>::create(&mut tree, root, 4).unwrap();
        assert_eq!(stack.pop(&mut tree).unwrap(), None);
        stack.push(&mut tree, 1.5).unwrap();
        stack.push(&mut tree, 2.5).unwrap();
        assert_eq!(stack.last(&tree).unwrap(), Some(2.5));
        assert_eq!(stack.pop(&mut tree).unwrap(), Some(2.5));
        assert_eq!(stack.count(&tree).unwrap(), 1);
        assert_eq!(stack.last(&tree).unwrap(), Some(1.5));
    }

    #[test]
    fn raw_push_checks_element_width() {
        let mut buf = vec![0u8; 64];
        let mut tree = RegionTree::init(Some(&mut buf));
        let root = tree.root();
        let stack = RawStack::create(&mut tree, root, 4, 4).unwrap();
        assert_eq!(
            stack.push(&mut tree, &[1, 2]),
            Err(ArenaError::ElementSize {
                expected: 4,
                actual: 2
            })
        );
        stack.push(&mut tree, &[1, 2, 3, 4]).unwrap();
        let items: Vec<&[u8]> = stack.iter(&tree).unwrap().collect();
        assert_eq!(items, vec![&[1u8, 2, 3, 4][..]]);
    }

    #[test]
    fn zero_sized_elements_are_rejected() {
        let mut buf = vec![0u8; 64];
        let mut tree = RegionTree::init(Some(&mut buf));
        let root = tree.root();
        assert_eq!(
            RawStack::create(&mut tree, root, 4, 0),
            Err(ArenaError::ZeroSizedElement)
        );
        assert_eq!(tree.used(root).unwrap(), 0);
    }

    #[test]
    fn create_out_of_space_mutates_nothing() {
        let mut buf = vec![0u8; 32];
        let mut tree = RegionTree::init(Some(&mut buf));
        let root = tree.root();
        let err = Stack::<u64>::create(&mut tree, root, 4).unwrap_err();
        assert!(matches!(err, ArenaError::OutOfSpace { requested: 48, .. }));
        assert_eq!(tree.used(root).unwrap(), 0);

        let err = RawStack::create(&mut tree, root, usize::MAX, 8).unwrap_err();
        assert!(matches!(
            err,
            ArenaError::OutOfSpace {
                requested: usize::MAX,
                ..
            }
        ));
    }

    #[test]
    fn overwritten_header_is_detected() {
        let mut buf = vec![0u8; 64];
        let mut tree = RegionTree::init(Some(&mut buf));
        let root = tree.root();
        let stack = Stack::<u8>::create(&mut tree, root, 4).unwrap();
        tree.region_bytes_mut(stack.region()).unwrap()[..HEADER_SIZE].fill(0xFF);
        assert!(matches!(
            stack.count(&tree),
            Err(ArenaError::Protocol(ProtocolViolation::HeaderCorrupt { .. }))
        ));
    }

    #[test]
    fn stack_goes_stale_with_its_ancestor() {
        let mut buf = vec![0u8; 64];
        let mut tree = RegionTree::init(Some(&mut buf));
        let root = tree.root();
        let stack = Stack::<u8>::create(&mut tree, root, 4).unwrap();
        tree.reset(root).unwrap();
        assert!(matches!(
            stack.push(&mut tree, 1),
            Err(ArenaError::Protocol(ProtocolViolation::StaleRegion { .. }))
        ));
    }

    #[test]
    fn copies_of_a_handle_share_state() {
        let mut buf = vec![0u8; 64];
        let mut tree = RegionTree::init(Some(&mut buf));
        let root = tree.root();
        let a = Stack::<u8>::create(&mut tree, root, 4).unwrap();
        let b = a;
        a.push(&mut tree, 5).unwrap();
        assert_eq!(b.count(&tree).unwrap(), 1);
        assert_eq!(b.get(&tree, 0).unwrap(), Some(5));
    }
}
