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
//! Single-threaded reference driver

use super::{check_dimension, Simulator, StepObserver};
use crate::config::SimConfig;
use crate::error::Result;
use crate::kernel::step_range;
use crate::progress::PeriodicLogger;
use crate::state::BodyState;
use log::{info, trace, Level};

/// Runs every phase over the full range on the calling thread
///
/// Its output is the ground truth the parallel strategies are checked
/// against.
pub struct SequentialSimulator {
    config: SimConfig,
}

impl SequentialSimulator {
    /// Create a sequential simulator after validating `config`
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        Ok(SequentialSimulator { config })
    }

    /// The configuration this simulator runs with
    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}

impl Simulator for SequentialSimulator {
    fn name(&self) -> &str {
        "sequential"
    }

    fn run_observed(&mut self, state: &mut BodyState, observer: StepObserver<'_>) -> Result<()> {
        check_dimension(&self.config, state)?;
        let n = state.len();
        let steps = self.config.steps;
        let params = self.config.gravity();
        info!("sequential: {} bodies, {} steps", n, steps);

        let mut progress = PeriodicLogger::new("sequential: integrating", Level::Info);
        for step in 0..steps {
            step_range(state, 0, n, &params, self.config.dt)?;
            trace!("sequential: step {} done", step);
            observer(step, state);
            progress.log(format_args!("step {} / {}", step + 1, steps));
        }

        info!("sequential: finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Body, Dimension};

    #[test]
    fn test_invalid_config_rejected() {
        assert!(SequentialSimulator::new(SimConfig::new(10, 5).with_dt(0.0)).is_err());
    }

    #[test]
    fn test_observer_sees_every_step_in_order() {
        let mut state = BodyState::from_bodies(
            &[
                Body::new([0.0, 0.0, 0.0], [0.0; 3], 1.0),
                Body::new([1.0, 0.0, 0.0], [0.0; 3], 1.0),
            ],
            Dimension::Two,
        )
        .unwrap();
        let mut sim = SequentialSimulator::new(SimConfig::new(2, 4)).unwrap();

        let mut seen = Vec::new();
        sim.run_observed(&mut state, &mut |step, s| seen.push((step, s.x()[0])))
            .unwrap();

        assert_eq!(seen.iter().map(|(step, _)| *step).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        // Observed after integrate: body 0 has already moved towards body 1
        assert!(seen[0].1 > 0.0);
        assert!(seen.windows(2).all(|w| w[1].1 > w[0].1));
        assert_eq!(seen[3].1, state.x()[0]);
    }

    #[test]
    fn test_zero_steps_leaves_state_untouched() {
        let mut state = BodyState::from_bodies(
            &[Body::new([1.0, 2.0, 0.0], [3.0, 4.0, 0.0], 1.0)],
            Dimension::Two,
        )
        .unwrap();
        let before = state.clone();
        SequentialSimulator::new(SimConfig::new(1, 0)).unwrap().run(&mut state).unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut state = BodyState::from_bodies(
            &[Body::new([1.0, 2.0, 3.0], [0.0; 3], 1.0)],
            Dimension::Three,
        )
        .unwrap();
        let before = state.clone();
        let mut sim = SequentialSimulator::new(SimConfig::new(1, 3)).unwrap();
        assert!(matches!(sim.run(&mut state), Err(crate::SimError::InvalidConfig(_))));
        assert_eq!(state, before);
    }
}
