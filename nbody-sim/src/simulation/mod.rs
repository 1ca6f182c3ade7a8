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
//! Simulation drivers
//!
//! Three interchangeable strategies advance a [`BodyState`] by a fixed
//! number of steps. Each step is zero → compute → integrate; the strategies
//! differ only in how the index space is split and synchronised:
//!
//! | Strategy | Split | Synchronisation |
//! |----------|-------|-----------------|
//! | [`SequentialSimulator`] | none | none; defines the reference trajectory |
//! | [`SharedMemorySimulator`] | `min(T, N)` partitions of one shared state | join after every phase |
//! | [`DistributedSimulator`] | one partition per rank, one state per rank | all-gather of positions after every step |
//!
//! Because every body's arithmetic is independent of the split, all three
//! produce the same state for the same configuration and seed.
//!
//! # Observers
//!
//! An observer is called as `observer(step, &state)` strictly after the
//! integrate phase of `step` and before `step + 1` begins. It receives a
//! shared reference, so it cannot mutate the state.

mod distributed;
mod sequential;
mod shared;

pub use distributed::{run_local_cluster, run_local_cluster_all, DistributedSimulator};
pub use sequential::SequentialSimulator;
pub use shared::SharedMemorySimulator;

use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::state::BodyState;

/// Callback invoked once per completed step
pub type StepObserver<'a> = &'a mut dyn FnMut(usize, &BodyState);

/// A strategy that advances a state by the configured number of steps
///
/// The body count is taken from the state; the configuration supplies step
/// count, Δt, G and ε. A state whose dimensionality differs from the
/// configuration's is rejected with [`SimError::InvalidConfig`] before the
/// first step.
pub trait Simulator {
    /// Short strategy name used in logs and snapshot file names
    fn name(&self) -> &str;

    /// Run every step, calling `observer` after each completed step
    fn run_observed(&mut self, state: &mut BodyState, observer: StepObserver<'_>) -> Result<()>;

    /// Run every step without observing intermediate states
    fn run(&mut self, state: &mut BodyState) -> Result<()> {
        self.run_observed(state, &mut |_, _| {})
    }
}

/// Reject a state whose dimensionality differs from the configuration's
pub(crate) fn check_dimension(config: &SimConfig, state: &BodyState) -> Result<()> {
    if state.dimension() != config.dimension {
        return Err(SimError::invalid_config(format!(
            "state is {:?}-dimensional but the configuration asks for {:?}",
            state.dimension(),
            config.dimension
        )));
    }
    Ok(())
}
