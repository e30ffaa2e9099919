//! Lane descriptors and work partitioning.
//!
//! Every lane runs the same kernel body; the partitioner decides which
//! output coordinates a lane owns. Two policies are used by the kernels:
//!
//! - **strided**: the lane visits `id, id + n, id + 2n, ...`
//! - **block**: the lane owns one contiguous span; the remainder of
//!   `len / n` goes to the lowest-indexed lanes, one element each
//!
//! For a fixed lane count the sets produced for all ids are disjoint and
//! together cover the domain, which is what lets lanes write a shared
//! output buffer without locks.

use std::iter::StepBy;
use std::ops::Range;

use crate::{Result, TesseraError};

/// Identity of one worker in a fixed-size team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lane {
    id: usize,
    num_lanes: usize,
}

impl Lane {
    /// Create a lane descriptor. `id` must lie in `[0, num_lanes)`.
    pub fn new(id: usize, num_lanes: usize) -> Result<Self> {
        if num_lanes == 0 || id >= num_lanes {
            return Err(TesseraError::InvalidLane { id, num_lanes });
        }
        Ok(Self { id, num_lanes })
    }

    /// The only lane of a one-lane team.
    pub fn single() -> Self {
        Self { id: 0, num_lanes: 1 }
    }

    /// Every lane of a team of `num_lanes`, ascending by id.
    pub fn all(num_lanes: usize) -> impl Iterator<Item = Lane> {
        (0..num_lanes).map(move |id| Lane { id, num_lanes })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn num_lanes(&self) -> usize {
        self.num_lanes
    }

    /// Coordinates in `[lo, hi)` owned under strided partitioning.
    ///
    /// The first coordinate is `id` advanced in steps of `num_lanes` until it
    /// reaches `lo`, so ownership stays `c % num_lanes == id` regardless of
    /// where the valid range begins.
    pub fn strided(&self, lo: usize, hi: usize) -> StepBy<Range<usize>> {
        let start = if self.id >= lo {
            self.id
        } else {
            let steps = (lo - self.id).div_ceil(self.num_lanes);
            self.id + steps * self.num_lanes
        };
        // start may overshoot hi; an empty range is fine
        (start..hi.max(start)).step_by(self.num_lanes)
    }

    /// Contiguous block of `[0, len)` owned under block partitioning.
    pub fn block(&self, len: usize) -> Range<usize> {
        let div = len / self.num_lanes;
        let rem = len % self.num_lanes;
        let extra = self.id.min(rem);
        let start = div * self.id + extra;
        let end = div * (self.id + 1) + extra + usize::from(self.id < rem);
        start..end
    }
}

/// Intersect `range` with `[lo, hi)`. Never yields a reversed range.
pub fn clamp_range(range: Range<usize>, lo: usize, hi: usize) -> Range<usize> {
    let start = range.start.max(lo);
    let end = range.end.min(hi);
    start..end.max(start)
}
