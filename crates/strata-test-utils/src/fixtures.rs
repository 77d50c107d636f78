//! Reusable region workloads.
//!
//! - [`ScratchWorkload`]: nested push, fill, pop in reverse order.
//! - [`fill_stack`]: push a sequence of values onto a typed stack.

use strata_arena::{ArenaError, Element, RegionId, RegionTree, ScopedRegion, Stack};

/// Nested scratch regions pushed in order, filled, then popped in reverse.
///
/// Mirrors a call stack where each frame borrows `sizes[i]` bytes of
/// scratch space.
#[derive(Clone, Debug)]
pub struct ScratchWorkload {
    pub sizes: Vec<usize>,
    /// Byte written over every scratch region before it is popped.
    pub fill: u8,
}

/// What a [`ScratchWorkload`] observed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkloadReport {
    /// Parent `used` before the first push.
    pub used_before: usize,
    /// Parent `used` with every frame open.
    pub peak_used: usize,
    /// Parent `used` after the last pop.
    pub used_after: usize,
    /// Region-relative `(start, end)` of each frame within the parent.
    pub extents: Vec<(usize, usize)>,
}

impl ScratchWorkload {
    pub fn new(sizes: impl Into<Vec<usize>>, fill: u8) -> Self {
        Self {
            sizes: sizes.into(),
            fill,
        }
    }

    /// Run the workload against `parent`.
    ///
    /// Stops at the first error; frames already pushed are popped before
    /// the error is returned.
    pub fn run(
        &self,
        tree: &mut RegionTree<'_>,
        parent: RegionId,
    ) -> Result<WorkloadReport, ArenaError> {
        let used_before = tree.used(parent)?;
        let mut frames: Vec<ScopedRegion> = Vec::with_capacity(self.sizes.len());
        let mut extents = Vec::with_capacity(self.sizes.len());
        let mut failure = None;

        for &size in &self.sizes {
            let start = tree.used(parent)?;
            match tree.push(parent, size) {
                Ok(frame) => {
                    tree.region_bytes_mut(frame.region())?.fill(self.fill);
                    extents.push((start, start + size));
                    frames.push(frame);
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        let peak_used = tree.used(parent)?;

        while let Some(frame) = frames.pop() {
            tree.pop(frame)?;
        }
        if let Some(e) = failure {
            return Err(e);
        }

        Ok(WorkloadReport {
            used_before,
            peak_used,
            used_after: tree.used(parent)?,
            extents,
        })
    }
}

/// Push every value onto `stack`, stopping at the first error.
pub fn fill_stack<T: Element>(
    tree: &mut RegionTree<'_>,
    stack: &Stack<T>,
    values: impl IntoIterator<Item = T>,
) -> Result<usize, ArenaError> {
    let mut pushed = 0;
    for value in values {
        stack.push(tree, value)?;
        pushed += 1;
    }
    Ok(pushed)
}
