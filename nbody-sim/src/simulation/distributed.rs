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
//! Distributed-memory driver
//!
//! Every worker holds a complete copy of the state but only advances the
//! bodies of its own partition. After each step the updated positions are
//! all-gathered and written back in rank order, so every replica starts the
//! next step with identical global positions.
//!
//! Velocities are only needed by the owner during the step loop. They are
//! gathered on snapshot steps, for the rank 0 observer, and once more after
//! the last step so the returned state is complete.
//!
//! Accelerations of bodies owned by other ranks are never exchanged and are
//! stale in every replica.

use super::{check_dimension, Simulator, StepObserver};
use crate::comm::{Communicator, LocalCluster};
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::kernel::step_range;
use crate::progress::PeriodicLogger;
use crate::state::{BodyState, Partition};
use log::{debug, info, trace, Level};
use std::thread;

/// One rank of a distributed run
pub struct DistributedSimulator<C: Communicator> {
    config: SimConfig,
    comm: C,
}

impl<C: Communicator> DistributedSimulator<C> {
    /// Bind a validated configuration to this rank's communicator
    pub fn new(config: SimConfig, comm: C) -> Result<Self> {
        config.validate()?;
        Ok(DistributedSimulator { config, comm })
    }

    /// Rank of this worker
    pub fn rank(&self) -> usize {
        self.comm.rank()
    }

    /// Partition of an `n`-body state owned by this worker
    pub fn partition(&self, n: usize) -> Result<Partition> {
        Partition::for_rank(n, self.comm.rank(), self.comm.size())
    }

    /// Replace `axis` with the concatenation of every rank's owned slice
    fn share_axis(&self, axis: &mut [f64], own: &Partition) -> Result<()> {
        let gathered = self.comm.all_gather(&axis[own.range()])?;
        reassemble(axis, &gathered)
    }

    fn share_positions(&self, state: &mut BodyState, own: &Partition) -> Result<()> {
        self.share_axis(&mut state.x, own)?;
        self.share_axis(&mut state.y, own)?;
        if state.dimension().is_3d() {
            self.share_axis(&mut state.z, own)?;
        }
        Ok(())
    }

    fn share_velocities(&self, state: &mut BodyState, own: &Partition) -> Result<()> {
        self.share_axis(&mut state.vx, own)?;
        self.share_axis(&mut state.vy, own)?;
        if state.dimension().is_3d() {
            self.share_axis(&mut state.vz, own)?;
        }
        Ok(())
    }
}

/// Write rank-ordered chunks back into `destination`
///
/// Each chunk must be exactly as long as the partition its rank owns.
fn reassemble(destination: &mut [f64], chunks: &[Vec<f64>]) -> Result<()> {
    let n = destination.len();
    let size = chunks.len();
    for (rank, chunk) in chunks.iter().enumerate() {
        let part = Partition::for_rank(n, rank, size)?;
        if chunk.len() != part.len() {
            return Err(SimError::ExchangeMismatch {
                expected: part.len(),
                actual: chunk.len(),
            });
        }
        destination[part.range()].copy_from_slice(chunk);
    }
    Ok(())
}

impl<C: Communicator> Simulator for DistributedSimulator<C> {
    fn name(&self) -> &str {
        "distributed"
    }

    /// Run this rank's share of every step
    ///
    /// Every rank of the group must call this with an identical initial
    /// state. The observer is only called on rank 0 and only for snapshot
    /// steps, after the velocity exchange.
    fn run_observed(&mut self, state: &mut BodyState, observer: StepObserver<'_>) -> Result<()> {
        check_dimension(&self.config, state)?;
        let n = state.len();
        let steps = self.config.steps;
        let params = self.config.gravity();
        let own = self.partition(n)?;
        let lead = self.rank() == 0;

        if lead {
            info!(
                "distributed: {} bodies, {} steps, {} ranks",
                n,
                steps,
                self.comm.size()
            );
        }
        debug!(
            "distributed: rank {} owns [{}, {})",
            self.rank(),
            own.start(),
            own.end()
        );

        let mut progress = lead.then(|| PeriodicLogger::new("distributed: integrating", Level::Info));
        for step in 0..steps {
            step_range(state, own.start(), own.end(), &params, self.config.dt)?;
            self.share_positions(state, &own)?;
            trace!("distributed: rank {} step {} done", self.rank(), step);

            if self.config.is_snapshot_step(step) {
                self.share_velocities(state, &own)?;
                if lead {
                    observer(step, state);
                }
            }
            if let Some(progress) = progress.as_mut() {
                progress.log(format_args!("step {} / {}", step + 1, steps));
            }
        }
        self.share_velocities(state, &own)?;

        if lead {
            info!("distributed: finished");
        }
        Ok(())
    }
}

/// Run a distributed simulation on an in-process cluster and return every replica
///
/// Spawns one thread per rank. Each rank builds its own initial state with
/// `init`, which must be deterministic so all replicas agree. `observer` is
/// handed to rank 0.
///
/// A rank that fails drops its communicator, which closes the group: the
/// other ranks leave their next exchange with
/// [`SimError::CommunicatorClosed`] instead of waiting forever.
///
/// # Errors
///
/// Returns the first root-cause error in rank order: a rank's own error, or
/// [`SimError::WorkerFailed`] if its thread panicked. `CommunicatorClosed` is
/// only returned when no rank reported anything else.
pub fn run_local_cluster_all<I, O>(
    config: &SimConfig,
    workers: usize,
    init: I,
    observer: O,
) -> Result<Vec<BodyState>>
where
    I: Fn() -> Result<BodyState> + Sync,
    O: FnMut(usize, &BodyState) + Send,
{
    config.validate()?;
    let members = LocalCluster::new(workers)?;
    let mut observer = Some(observer);
    let init = &init;

    let outcomes: Vec<thread::Result<Result<BodyState>>> = thread::scope(|scope| {
        let handles: Vec<_> = members
            .into_iter()
            .map(|comm| {
                let mut rank_observer = if comm.rank() == 0 { observer.take() } else { None };
                let config = config.clone();
                scope.spawn(move || -> Result<BodyState> {
                    let mut state = init()?;
                    let mut sim = DistributedSimulator::new(config, comm)?;
                    match rank_observer.as_mut() {
                        Some(observe) => sim.run_observed(&mut state, observe)?,
                        None => sim.run(&mut state)?,
                    }
                    Ok(state)
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join()).collect()
    });

    let mut closed = false;
    let mut replicas = Vec::with_capacity(outcomes.len());
    for (rank, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(Ok(state)) => replicas.push(state),
            // A peer's failure closed the group; keep looking for the cause
            Ok(Err(SimError::CommunicatorClosed)) => closed = true,
            Ok(Err(err)) => return Err(err),
            Err(_) => return Err(SimError::WorkerFailed { rank }),
        }
    }
    if closed {
        return Err(SimError::CommunicatorClosed);
    }
    Ok(replicas)
}

/// Run a distributed simulation on an in-process cluster and return rank 0's state
pub fn run_local_cluster<I, O>(
    config: &SimConfig,
    workers: usize,
    init: I,
    observer: O,
) -> Result<BodyState>
where
    I: Fn() -> Result<BodyState> + Sync,
    O: FnMut(usize, &BodyState) + Send,
{
    run_local_cluster_all(config, workers, init, observer)?
        .into_iter()
        .next()
        .ok_or(SimError::InvalidWorkerCount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::SequentialSimulator;
    use crate::state::{Body, Dimension};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ring(n: usize, dimension: Dimension) -> Result<BodyState> {
        let bodies: Vec<Body> = (0..n)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::TAU / n as f64;
                Body::new(
                    [angle.cos(), angle.sin(), 0.1 * (2.0 * angle).sin()],
                    [-0.2 * angle.sin(), 0.2 * angle.cos(), 0.0],
                    1.0 + 0.1 * i as f64,
                )
            })
            .collect();
        BodyState::from_bodies(&bodies, dimension)
    }

    fn sequential(config: &SimConfig, n: usize) -> BodyState {
        let mut state = ring(n, config.dimension).unwrap();
        SequentialSimulator::new(config.clone())
            .unwrap()
            .run(&mut state)
            .unwrap();
        state
    }

    #[test]
    fn test_reassemble_checks_chunk_lengths() {
        let mut destination = vec![0.0; 5];
        reassemble(&mut destination, &[vec![1.0, 2.0], vec![3.0, 4.0, 5.0]]).unwrap();
        assert_eq!(destination, vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        let err = reassemble(&mut destination, &[vec![1.0, 2.0, 3.0], vec![4.0, 5.0]]);
        assert!(matches!(
            err,
            Err(SimError::ExchangeMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_matches_sequential_positions_and_velocities() {
        for dimension in [Dimension::Two, Dimension::Three] {
            let config = SimConfig::new(11, 15).with_dimension(dimension);
            let expected = sequential(&config, 11);
            for workers in [1, 2, 3, 4] {
                let state =
                    run_local_cluster(&config, workers, || ring(11, dimension), |_, _| {}).unwrap();
                assert_eq!(state.x(), expected.x(), "workers = {}", workers);
                assert_eq!(state.y(), expected.y());
                assert_eq!(state.z(), expected.z());
                assert_eq!(state.vx(), expected.vx());
                assert_eq!(state.vy(), expected.vy());
                assert_eq!(state.vz(), expected.vz());
            }
        }
    }

    #[test]
    fn test_every_replica_holds_global_state() {
        let config = SimConfig::new(7, 6);
        let replicas =
            run_local_cluster_all(&config, 3, || ring(7, Dimension::Two), |_, _| {}).unwrap();
        assert_eq!(replicas.len(), 3);
        for replica in &replicas[1..] {
            assert_eq!(replica.x(), replicas[0].x());
            assert_eq!(replica.vy(), replicas[0].vy());
        }
    }

    #[test]
    fn test_surplus_ranks_idle() {
        let config = SimConfig::new(2, 4);
        let expected = sequential(&config, 2);
        let state = run_local_cluster(&config, 5, || ring(2, Dimension::Two), |_, _| {}).unwrap();
        assert_eq!(state.x(), expected.x());
        assert_eq!(state.vx(), expected.vx());
    }

    #[test]
    fn test_observer_sees_snapshot_steps_only() {
        let config = SimConfig::new(6, 10).with_snapshots(4, "unused");
        let through_step_8 = sequential(&SimConfig::new(6, 9), 6);
        let mut seen = Vec::new();
        run_local_cluster(&config, 2, || ring(6, Dimension::Two), |step, state: &BodyState| {
            seen.push((step, state.vx().to_vec()));
        })
        .unwrap();

        let steps: Vec<usize> = seen.iter().map(|(step, _)| *step).collect();
        assert_eq!(steps, vec![0, 4, 8]);
        assert!(seen.iter().all(|(_, vx)| vx.len() == 6));
        assert_eq!(seen[2].1, through_step_8.vx());
    }

    #[test]
    fn test_init_failure_reported() {
        let config = SimConfig::new(4, 1);
        let err = run_local_cluster(&config, 2, || Err(SimError::EmptySystem), |_, _| {});
        assert!(matches!(err, Err(SimError::EmptySystem)));
    }

    #[test]
    fn test_worker_panic_reported() {
        let config = SimConfig::new(4, 1);
        let err = run_local_cluster(
            &config,
            1,
            || -> Result<BodyState> { panic!("init exploded") },
            |_, _| {},
        );
        assert!(matches!(err, Err(SimError::WorkerFailed { rank: 0 })));
    }

    #[test]
    fn test_one_rank_panicking_does_not_stall_peers() {
        let config = SimConfig::new(8, 3);
        let calls = AtomicUsize::new(0);
        let err = run_local_cluster(
            &config,
            2,
            || {
                if calls.fetch_add(1, Ordering::SeqCst) == 1 {
                    panic!("second replica failed to initialise");
                }
                ring(8, Dimension::Two)
            },
            |_, _| {},
        );
        assert!(matches!(err, Err(SimError::WorkerFailed { .. })));
    }

    #[test]
    fn test_one_rank_error_reported_over_closed_peers() {
        let config = SimConfig::new(9, 5);
        let calls = AtomicUsize::new(0);
        let err = run_local_cluster(
            &config,
            3,
            || {
                if calls.fetch_add(1, Ordering::SeqCst) == 2 {
                    return Err(SimError::EmptySystem);
                }
                ring(9, Dimension::Two)
            },
            |_, _| {},
        );
        assert!(matches!(err, Err(SimError::EmptySystem)));
    }

    #[test]
    fn test_dimension_mismatch_rejected_on_every_rank() {
        let config = SimConfig::new(5, 2).with_dimension(Dimension::Three);
        let err = run_local_cluster(&config, 2, || ring(5, Dimension::Two), |_, _| {});
        assert!(matches!(err, Err(SimError::InvalidConfig(_))));
    }
}
