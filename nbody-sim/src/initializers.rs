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
//! Initial conditions
//!
//! Every generator is a pure function of its arguments. In particular
//! [`create_random`] draws from a seeded PCG stream, so each distributed
//! worker can rebuild the same initial state locally instead of receiving it.

use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::state::{Body, BodyState, Dimension};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::f64::consts::TAU;

/// Sampling ranges for [`create_random_with`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomRanges {
    /// Positions are drawn from `[-position, position]`
    pub position: f64,
    /// Velocities are drawn from `[-velocity, velocity]`
    pub velocity: f64,
    /// Smallest mass
    pub mass_min: f64,
    /// Largest mass
    pub mass_max: f64,
}

impl Default for RandomRanges {
    fn default() -> Self {
        RandomRanges {
            position: 1.0,
            velocity: 0.1,
            mass_min: 0.5,
            mass_max: 5.0,
        }
    }
}

impl RandomRanges {
    fn validate(&self) -> Result<()> {
        if !(self.position.is_finite() && self.position >= 0.0) {
            return Err(SimError::invalid_config("position range must be finite and non-negative"));
        }
        if !(self.velocity.is_finite() && self.velocity >= 0.0) {
            return Err(SimError::invalid_config("velocity range must be finite and non-negative"));
        }
        if !(self.mass_min.is_finite() && self.mass_max.is_finite())
            || self.mass_min <= 0.0
            || self.mass_min > self.mass_max
        {
            return Err(SimError::invalid_config(
                "mass range must satisfy 0 < mass_min <= mass_max",
            ));
        }
        Ok(())
    }
}

fn uniform(rng: &mut Pcg64Mcg, low: f64, high: f64) -> f64 {
    low + (high - low) * rng.gen::<f64>()
}

/// Seeded random state with the default ranges
///
/// Equivalent to `create_random_with(config, RandomRanges::default())`.
pub fn create_random(config: &SimConfig) -> Result<BodyState> {
    create_random_with(config, RandomRanges::default())
}

/// Seeded random state for `config.bodies` bodies
///
/// Per body the draws are x, y, (z), vx, vy, (vz), mass, where the
/// bracketed draws only happen in 3D. The mass-weighted mean velocity is
/// then subtracted so the system's net momentum is zero up to rounding.
///
/// # Errors
///
/// Fails if the configuration or the ranges are invalid.
pub fn create_random_with(config: &SimConfig, ranges: RandomRanges) -> Result<BodyState> {
    config.validate()?;
    ranges.validate()?;

    let spatial = config.dimension.is_3d();
    let mut rng = Pcg64Mcg::seed_from_u64(config.seed);
    let mut state = BodyState::new(config.bodies, config.dimension)?;
    let (p, v) = (ranges.position, ranges.velocity);

    for i in 0..config.bodies {
        state.x[i] = uniform(&mut rng, -p, p);
        state.y[i] = uniform(&mut rng, -p, p);
        if spatial {
            state.z[i] = uniform(&mut rng, -p, p);
        }
        state.vx[i] = uniform(&mut rng, -v, v);
        state.vy[i] = uniform(&mut rng, -v, v);
        if spatial {
            state.vz[i] = uniform(&mut rng, -v, v);
        }
        state.mass[i] = uniform(&mut rng, ranges.mass_min, ranges.mass_max);
    }

    remove_net_momentum(&mut state);
    Ok(state)
}

fn remove_net_momentum(state: &mut BodyState) {
    let total_mass: f64 = state.mass.iter().sum();
    if total_mass <= 0.0 {
        return;
    }
    let mean = |v: &[f64], mass: &[f64]| -> f64 {
        v.iter().zip(mass).map(|(v, m)| v * m).sum::<f64>() / total_mass
    };
    let (ox, oy) = (mean(&state.vx, &state.mass), mean(&state.vy, &state.mass));
    state.vx.iter_mut().for_each(|v| *v -= ox);
    state.vy.iter_mut().for_each(|v| *v -= oy);
    if state.dimension().is_3d() {
        let oz = mean(&state.vz, &state.mass);
        state.vz.iter_mut().for_each(|v| *v -= oz);
    }
}

/// Two equal masses on a circular orbit about their common barycentre
///
/// The bodies sit at `(±separation/2, 0)` and move along ∓y with speed
/// `sqrt(G·m / (2·separation))`, which balances their mutual attraction
/// when softening is negligible.
pub fn two_body_circular(mass: f64, separation: f64, g: f64, dimension: Dimension) -> Result<BodyState> {
    if !(mass > 0.0 && separation > 0.0 && g > 0.0) {
        return Err(SimError::invalid_config(
            "two-body orbit needs positive mass, separation and G",
        ));
    }
    let half = separation / 2.0;
    let speed = (g * mass / (2.0 * separation)).sqrt();
    BodyState::from_bodies(
        &[
            Body::new([-half, 0.0, 0.0], [0.0, -speed, 0.0], mass),
            Body::new([half, 0.0, 0.0], [0.0, speed, 0.0], mass),
        ],
        dimension,
    )
}

/// Period of the orbit produced by [`two_body_circular`]
pub fn orbital_period(mass: f64, separation: f64, g: f64) -> f64 {
    TAU * (separation.powi(3) / (2.0 * g * mass)).sqrt()
}
