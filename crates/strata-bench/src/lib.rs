//! Benchmark profiles for the strata region allocator.
//!
//! - [`reference_profile`]: 1 MiB buffer, eight nested scratch frames.
//! - [`stress_profile`]: 16 MiB buffer, 64 nested frames, large stacks.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use strata_arena::{ArenaError, RegionId, RegionTree, HEADER_SIZE};

/// Sizes and counts for one benchmark configuration.
#[derive(Clone, Debug)]
pub struct BenchProfile {
    /// Root buffer size in bytes.
    pub buffer_len: usize,
    /// Scratch frame sizes, outermost first.
    pub frame_sizes: Vec<usize>,
    /// Size of each small allocation in the bump benchmarks.
    pub alloc_size: usize,
    /// Element capacity of benchmark stacks.
    pub stack_capacity: usize,
}

impl BenchProfile {
    /// A zeroed root buffer of `buffer_len` bytes.
    pub fn buffer(&self) -> Vec<u8> {
        vec![0; self.buffer_len]
    }

    /// Total bytes reserved with every frame open.
    pub fn frame_bytes(&self) -> usize {
        self.frame_sizes.iter().sum()
    }

    /// Root bytes taken by one stack of `stack_capacity` elements.
    pub fn stack_bytes(&self, element_size: usize) -> usize {
        HEADER_SIZE + self.stack_capacity * element_size
    }

    /// How many `alloc_size` allocations fit in the root.
    pub fn allocs_per_fill(&self) -> usize {
        self.buffer_len / self.alloc_size.max(1)
    }
}

/// Build the reference profile: 1 MiB root, frames doubling from 64 bytes.
pub fn reference_profile() -> BenchProfile {
    BenchProfile {
        buffer_len: 1 << 20,
        frame_sizes: (0..8).map(|i| 64 << i).collect(),
        alloc_size: 32,
        stack_capacity: 1024,
    }
}

/// Build the stress profile: 16 MiB root, 64 frames of 4-64 KiB.
pub fn stress_profile() -> BenchProfile {
    BenchProfile {
        buffer_len: 16 << 20,
        frame_sizes: (0..64).map(|i| 4096 << (i % 5)).collect(),
        alloc_size: 16,
        stack_capacity: 65_536,
    }
}

/// Allocate `alloc_size` chunks from `region` until it is full, then reset it.
///
/// Returns the number of successful allocations.
pub fn fill_and_reset(
    tree: &mut RegionTree<'_>,
    region: RegionId,
    alloc_size: usize,
) -> Result<usize, ArenaError> {
    let mut count = 0;
    while tree.available(region)? >= alloc_size {
        tree.allocate(region, alloc_size)?;
        count += 1;
    }
    tree.reset(region)?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_arena::Stack;

    #[test]
    fn reference_frames_fit_in_buffer() {
        let profile = reference_profile();
        assert_eq!(profile.frame_sizes.len(), 8);
        assert!(profile.frame_bytes() < profile.buffer_len);
    }

    #[test]
    fn stress_frames_fit_in_buffer() {
        let profile = stress_profile();
        assert!(profile.frame_bytes() < profile.buffer_len);
    }

    #[test]
    fn stress_stack_fits_and_fills() {
        let profile = stress_profile();
        assert!(profile.stack_bytes(4) < profile.buffer_len);
        let mut buf = profile.buffer();
        let mut tree = RegionTree::init(Some(&mut buf));
        let root = tree.root();
        let stack = Stack::<u32>::create(&mut tree, root, profile.stack_capacity).unwrap();
        for i in (0u32..).take(profile.stack_capacity) {
            stack.push(&mut tree, i).unwrap();
        }
        assert!(stack.is_full(&tree).unwrap());
        assert_eq!(tree.used(root).unwrap(), profile.stack_bytes(4));
    }

    #[test]
    fn fill_and_reset_counts_allocations() {
        let profile = BenchProfile {
            buffer_len: 100,
            frame_sizes: vec![],
            alloc_size: 32,
            stack_capacity: 0,
        };
        let mut buf = profile.buffer();
        let mut tree = RegionTree::init(Some(&mut buf));
        let root = tree.root();
        assert_eq!(fill_and_reset(&mut tree, root, 32).unwrap(), 3);
        assert_eq!(tree.used(root).unwrap(), 0);
    }
}
