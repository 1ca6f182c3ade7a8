// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Domain decomposition of the body index space
//!
//! Both parallel strategies derive their work split from the same
//! integer-division formula, `t·N/T .. (t+1)·N/T`, so a given
//! `(N, worker count)` always yields identical boundaries. Adjacent
//! partitions differ in size by at most one body and the last one always
//! ends at `N`.

use crate::error::{Result, SimError};
use std::ops::Range;

/// A contiguous half-open index range `[start, end)` owned by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Partition {
    start: usize,
    end: usize,
}

impl Partition {
    /// Create a partition, rejecting `start > end`
    ///
    /// Bounds against a state are checked later, when leases are taken.
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if start > end {
            return Err(SimError::ReversedRange { start, end });
        }
        Ok(Partition { start, end })
    }

    /// Partition owned by `rank` when `n` bodies are split over `size` workers
    ///
    /// Unlike [`partition_range`] the worker count is not capped at `n`: a
    /// distributed run has a fixed number of participants, and surplus ranks
    /// simply own an empty range.
    pub fn for_rank(n: usize, rank: usize, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(SimError::InvalidWorkerCount);
        }
        if rank >= size {
            return Err(SimError::invalid_config(format!(
                "rank {} is outside a group of {} workers",
                rank, size
            )));
        }
        Ok(Self::bounds(n, rank, size))
    }

    fn bounds(n: usize, t: usize, workers: usize) -> Self {
        Partition {
            start: t * n / workers,
            end: (t + 1) * n / workers,
        }
    }

    /// First index in the partition
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last index in the partition
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of bodies in the partition
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the partition owns no bodies
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The partition as a standard range
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether `index` falls inside the partition
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }
}

/// Split `[0, n)` into `min(workers, n)` contiguous, disjoint, ordered partitions
///
/// # Errors
///
/// Returns [`SimError::InvalidWorkerCount`] for zero workers and
/// [`SimError::EmptySystem`] for zero bodies.
pub fn partition_range(n: usize, workers: usize) -> Result<Vec<Partition>> {
    if workers == 0 {
        return Err(SimError::InvalidWorkerCount);
    }
    if n == 0 {
        return Err(SimError::EmptySystem);
    }
    let t = workers.min(n);
    Ok((0..t).map(|i| Partition::bounds(n, i, t)).collect())
}

/// Check that partitions are ordered, non-overlapping and inside `[0, len)`
pub(crate) fn check_partitions(parts: &[Partition], len: usize) -> Result<()> {
    let mut previous_end = 0;
    for part in parts {
        if part.end > len {
            return Err(SimError::RangeOutOfBounds {
                start: part.start,
                end: part.end,
                len,
            });
        }
        if part.start < previous_end {
            return Err(SimError::OverlappingPartitions);
        }
        previous_end = part.end;
    }
    Ok(())
}
