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
//! Shared-memory parallel driver
//!
//! One state, `min(T, N)` partitions, one task per partition per phase. The
//! state is split into disjoint leases before each phase, so every task
//! writes only the bodies it owns. Returning from the parallel loop is the
//! barrier between phases: no task observes positions that belong to the
//! next step.
//!
//! Without the `parallel` feature the partitions run one after another on
//! the calling thread, which yields the same results.

use super::{check_dimension, Simulator, StepObserver};
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::kernel::{accumulate_lease, integrate_lease, zero_lease};
use crate::progress::PeriodicLogger;
use crate::state::{partition_range, BodyState, Partition};
use log::{debug, info, trace, Level};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "parallel")]
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Runs each phase in parallel over a fixed pool of `T` workers
pub struct SharedMemorySimulator {
    config: SimConfig,
    workers: usize,
    #[cfg(feature = "parallel")]
    pool: ThreadPool,
}

impl SharedMemorySimulator {
    /// Create a simulator for `workers` partitions
    ///
    /// The pool gets `min(workers, config.bodies)` threads, since no more
    /// partitions than bodies ever run.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidWorkerCount`] when `workers == 0`, or the
    /// configuration's validation error.
    pub fn new(config: SimConfig, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(SimError::InvalidWorkerCount);
        }
        config.validate()?;

        #[cfg(feature = "parallel")]
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.min(config.bodies))
            .thread_name(|index| format!("nbody-worker-{}", index))
            .build()
            .map_err(|e| SimError::invalid_config(format!("thread pool: {}", e)))?;

        Ok(SharedMemorySimulator {
            config,
            workers,
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    /// Requested worker count `T`
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Threads actually running each phase
    pub fn threads(&self) -> usize {
        #[cfg(feature = "parallel")]
        let threads = self.pool.current_num_threads();
        #[cfg(not(feature = "parallel"))]
        let threads = 1;
        threads
    }

    /// The configuration this simulator runs with
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run `work` once per lease and return when every lease is done
    fn for_each_lease<L, F>(&self, leases: Vec<L>, work: F)
    where
        L: Send,
        F: Fn(&mut L) + Sync,
    {
        #[cfg(feature = "parallel")]
        {
            self.pool
                .install(|| leases.into_par_iter().for_each(|mut lease| work(&mut lease)));
        }

        #[cfg(not(feature = "parallel"))]
        {
            leases.into_iter().for_each(|mut lease| work(&mut lease));
        }
    }

    fn step(&self, state: &mut BodyState, parts: &[Partition]) -> Result<()> {
        let params = self.config.gravity();
        let dt = self.config.dt;

        {
            let (_, leases) = state.acceleration_leases(parts)?;
            self.for_each_lease(leases, zero_lease);
        }
        {
            let (sources, leases) = state.acceleration_leases(parts)?;
            self.for_each_lease(leases, |lease| accumulate_lease(&sources, lease, &params));
        }
        let leases = state.motion_leases(parts)?;
        self.for_each_lease(leases, |lease| integrate_lease(lease, dt));
        Ok(())
    }
}

impl Simulator for SharedMemorySimulator {
    fn name(&self) -> &str {
        "shared"
    }

    fn run_observed(&mut self, state: &mut BodyState, observer: StepObserver<'_>) -> Result<()> {
        check_dimension(&self.config, state)?;
        let steps = self.config.steps;
        let parts = partition_range(state.len(), self.workers)?;
        info!(
            "shared: {} bodies, {} steps, {} partitions over {} workers",
            state.len(),
            steps,
            parts.len(),
            self.workers
        );
        for part in &parts {
            debug!("shared: partition [{}, {})", part.start(), part.end());
        }

        let mut progress = PeriodicLogger::new("shared: integrating", Level::Info);
        for step in 0..steps {
            self.step(state, &parts)?;
            trace!("shared: step {} done", step);
            observer(step, state);
            progress.log(format_args!("step {} / {}", step + 1, steps));
        }

        info!("shared: finished");
        Ok(())
    }
}
