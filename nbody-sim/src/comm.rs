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
//! Collective exchange between distributed workers
//!
//! The distributed strategy only ever needs one collective: an all-gather in
//! which every participant contributes a contiguous chunk and receives every
//! chunk back, ordered by rank. [`Communicator`] is that seam. An MPI binding
//! would implement it with `MPI_Allgatherv`; [`LocalCluster`] implements it
//! in-process for tests and single-machine runs.
//!
//! # Failure Model
//!
//! The collective assumes every rank calls it the same number of times. A
//! rank that stays alive but stops calling stalls the others indefinitely;
//! there is no timeout. A [`LocalCommunicator`] that is dropped (its worker
//! returned or unwound) closes the whole group instead, and every blocked or
//! later exchange fails with [`SimError::CommunicatorClosed`]. An exchange
//! that every rank had already joined still completes.

use crate::error::{Result, SimError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

/// Blocking all-gather over a fixed group of workers
pub trait Communicator: Send {
    /// Rank of this participant, in `0..size()`
    fn rank(&self) -> usize;

    /// Number of participants in the group
    fn size(&self) -> usize;

    /// Contribute `local` and receive every participant's chunk in rank order
    ///
    /// Blocks until all participants have contributed. Chunks may differ in
    /// length between ranks.
    fn all_gather(&self, local: &[f64]) -> Result<Vec<Vec<f64>>>;
}

/// Slot table of the exchange in flight
struct Round {
    slots: Vec<Option<Vec<f64>>>,
    deposited: usize,
    /// Ranks of the last completed round that have not copied it out yet
    draining: usize,
    generation: u64,
    closed: bool,
}

impl Round {
    fn collect(&self) -> Result<Vec<Vec<f64>>> {
        self.slots
            .iter()
            .map(|slot| slot.clone().ok_or(SimError::CommunicatorClosed))
            .collect()
    }

    fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }
}

/// Shared rendezvous state for one in-process group
struct Exchange {
    round: Mutex<Round>,
    changed: Condvar,
}

impl Exchange {
    fn lock(&self) -> Result<MutexGuard<'_, Round>> {
        self.round.lock().map_err(|_| SimError::CommunicatorClosed)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, Round>) -> Result<MutexGuard<'a, Round>> {
        self.changed.wait(guard).map_err(|_| SimError::CommunicatorClosed)
    }

    fn close(&self) {
        // Closing must also work after a panic poisoned the lock
        let mut round = self.round.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        round.closed = true;
        drop(round);
        self.changed.notify_all();
    }
}

/// Factory for an in-process group of communicators
///
/// # Example
///
/// ```
/// use nbody_sim::comm::{Communicator, LocalCluster};
///
/// let members = LocalCluster::new(2).unwrap();
/// std::thread::scope(|scope| {
///     for comm in &members {
///         scope.spawn(move || {
///             let chunks = comm.all_gather(&[comm.rank() as f64]).unwrap();
///             assert_eq!(chunks, vec![vec![0.0], vec![1.0]]);
///         });
///     }
/// });
/// ```
pub struct LocalCluster;

impl LocalCluster {
    /// Create `size` connected communicators, one per rank
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidWorkerCount`] when `size == 0`.
    pub fn new(size: usize) -> Result<Vec<LocalCommunicator>> {
        if size == 0 {
            return Err(SimError::InvalidWorkerCount);
        }
        let exchange = Arc::new(Exchange {
            round: Mutex::new(Round {
                slots: vec![None; size],
                deposited: 0,
                draining: 0,
                generation: 0,
                closed: false,
            }),
            changed: Condvar::new(),
        });
        Ok((0..size)
            .map(|rank| LocalCommunicator {
                rank,
                size,
                exchange: Arc::clone(&exchange),
            })
            .collect())
    }
}

/// One rank's handle into a [`LocalCluster`]
///
/// Dropping a handle closes the group for every other rank.
pub struct LocalCommunicator {
    rank: usize,
    size: usize,
    exchange: Arc<Exchange>,
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn all_gather(&self, local: &[f64]) -> Result<Vec<Vec<f64>>> {
        let exchange = &self.exchange;
        let mut round = exchange.lock()?;

        // Slots are reused only once every rank has read the previous round
        while round.draining > 0 && !round.closed {
            round = exchange.wait(round)?;
        }
        if round.closed {
            return Err(SimError::CommunicatorClosed);
        }

        round.slots[self.rank] = Some(local.to_vec());
        round.deposited += 1;
        if round.deposited == self.size {
            let gathered = round.collect()?;
            round.deposited = 0;
            round.draining = self.size - 1;
            round.generation = round.generation.wrapping_add(1);
            if round.draining == 0 {
                round.clear();
            }
            drop(round);
            exchange.changed.notify_all();
            return Ok(gathered);
        }

        let generation = round.generation;
        while round.generation == generation {
            if round.closed {
                return Err(SimError::CommunicatorClosed);
            }
            round = exchange.wait(round)?;
        }
        let gathered = round.collect()?;
        round.draining -= 1;
        if round.draining == 0 {
            round.clear();
            drop(round);
            exchange.changed.notify_all();
        }
        Ok(gathered)
    }
}

impl Drop for LocalCommunicator {
    fn drop(&mut self) {
        self.exchange.close();
    }
}
