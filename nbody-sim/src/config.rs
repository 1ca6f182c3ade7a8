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
//! Run configuration
//!
//! A [`SimConfig`] is fixed for the lifetime of a run and shared by every
//! strategy, so that all of them start from the same seeded initial state
//! and derive the same partitions.
//!
//! # YAML format
//!
//! Every field is optional; missing fields take the defaults below.
//!
//! ```yaml
//! bodies: 1000
//! steps: 1000
//! dt: 0.01
//! g: 1.0
//! softening: 0.001
//! dimension: 2d        # or 3d
//! seed: 12345
//! snapshot_every: 0    # 0 disables snapshots
//! snapshot_dir: out
//! ```

use crate::error::{Result, SimError};
use crate::kernel::GravityParams;
use crate::state::Dimension;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Immutable description of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of bodies N
    pub bodies: usize,
    /// Number of steps to run
    pub steps: usize,
    /// Time step Δt
    pub dt: f64,
    /// Gravitational constant G
    pub g: f64,
    /// Softening length ε
    pub softening: f64,
    /// 2D or 3D dynamics
    pub dimension: Dimension,
    /// Seed for the deterministic initial conditions
    pub seed: u64,
    /// Steps between snapshots; 0 disables snapshots
    pub snapshot_every: usize,
    /// Directory that receives snapshot files
    pub snapshot_dir: PathBuf,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            bodies: 1000,
            steps: 1000,
            dt: 0.01,
            g: 1.0,
            softening: 1e-3,
            dimension: Dimension::Two,
            seed: 12345,
            snapshot_every: 0,
            snapshot_dir: PathBuf::from("out"),
        }
    }
}

impl SimConfig {
    /// Create a configuration with default physics for `bodies` bodies and `steps` steps
    pub fn new(bodies: usize, steps: usize) -> Self {
        SimConfig {
            bodies,
            steps,
            ..Self::default()
        }
    }

    /// Set the time step
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Set the gravitational constant
    pub fn with_g(mut self, g: f64) -> Self {
        self.g = g;
        self
    }

    /// Set the softening length
    pub fn with_softening(mut self, softening: f64) -> Self {
        self.softening = softening;
        self
    }

    /// Set the dimensionality
    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimension = dimension;
        self
    }

    /// Set the initial-condition seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable snapshots every `every` steps into `dir`
    pub fn with_snapshots(mut self, every: usize, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_every = every;
        self.snapshot_dir = dir.into();
        self
    }

    /// Gravity parameters consumed by the kernel
    pub fn gravity(&self) -> GravityParams {
        GravityParams::new(self.g, self.softening)
    }

    /// Whether a snapshot is due after `step` completes
    pub fn is_snapshot_step(&self, step: usize) -> bool {
        self.snapshot_every > 0 && step % self.snapshot_every == 0
    }

    /// Check every field against its valid domain
    pub fn validate(&self) -> Result<()> {
        if self.bodies == 0 {
            return Err(SimError::EmptySystem);
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SimError::invalid_config(format!(
                "dt must be positive and finite, got {}",
                self.dt
            )));
        }
        if !(self.g.is_finite() && self.g >= 0.0) {
            return Err(SimError::invalid_config(format!(
                "g must be non-negative and finite, got {}",
                self.g
            )));
        }
        if !(self.softening.is_finite() && self.softening >= 0.0) {
            return Err(SimError::invalid_config(format!(
                "softening must be non-negative and finite, got {}",
                self.softening
            )));
        }
        Ok(())
    }

    /// Parse and validate a YAML scenario
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: SimConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML scenario file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}
