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
//! Conserved quantities
//!
//! Semi-implicit Euler conserves neither energy nor momentum exactly, but
//! both should stay close to their initial values for small Δt. These
//! functions measure the drift.

use crate::kernel::GravityParams;
use crate::state::BodyState;

/// Total linear momentum Σ mᵢ·vᵢ
pub fn total_momentum(state: &BodyState) -> [f64; 3] {
    let mut p = [0.0; 3];
    for body in state.bodies() {
        for (component, v) in p.iter_mut().zip(body.velocity) {
            *component += body.mass * v;
        }
    }
    p
}

/// Total kinetic energy Σ ½·mᵢ·|vᵢ|²
pub fn kinetic_energy(state: &BodyState) -> f64 {
    state
        .bodies()
        .map(|body| {
            let v2: f64 = body.velocity.iter().map(|v| v * v).sum();
            0.5 * body.mass * v2
        })
        .sum()
}

/// Softened gravitational potential energy
///
/// Sums `-G·mᵢ·mⱼ / sqrt(r² + ε²)` over unordered pairs, which is the
/// potential whose gradient the kernel integrates.
pub fn potential_energy(state: &BodyState, params: &GravityParams) -> f64 {
    let eps2 = params.softening_squared();
    let (x, y, z, mass) = (state.x(), state.y(), state.z(), state.mass());
    let mut energy = 0.0;
    for i in 0..state.len() {
        for j in (i + 1)..state.len() {
            let dx = x[j] - x[i];
            let dy = y[j] - y[i];
            let dz = z[j] - z[i];
            let r = (dx * dx + dy * dy + dz * dz + eps2).sqrt();
            energy -= params.g * mass[i] * mass[j] / r;
        }
    }
    energy
}

/// Kinetic plus potential energy
pub fn total_energy(state: &BodyState, params: &GravityParams) -> f64 {
    kinetic_energy(state) + potential_energy(state, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Body, Dimension};

    fn pair() -> BodyState {
        BodyState::from_bodies(
            &[
                Body::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 2.0),
                Body::new([3.0, 4.0, 0.0], [0.0, -2.0, 0.0], 1.0),
            ],
            Dimension::Two,
        )
        .unwrap()
    }

    #[test]
    fn test_momentum() {
        assert_eq!(total_momentum(&pair()), [2.0, -2.0, 0.0]);
    }

    #[test]
    fn test_kinetic_energy() {
        // ½·2·1 + ½·1·4
        assert_eq!(kinetic_energy(&pair()), 3.0);
    }

    #[test]
    fn test_potential_energy_unsoftened() {
        let params = GravityParams::new(1.0, 0.0);
        assert_eq!(potential_energy(&pair(), &params), -2.0 / 5.0);
        assert_eq!(total_energy(&pair(), &params), 3.0 - 0.4);
    }

    #[test]
    fn test_softening_raises_potential() {
        let soft = potential_energy(&pair(), &GravityParams::new(1.0, 1.0));
        assert!(soft > -0.4);
    }

    #[test]
    fn test_single_body_has_no_potential() {
        let state = BodyState::new(1, Dimension::Three).unwrap();
        assert_eq!(potential_energy(&state, &GravityParams::default()), 0.0);
    }
}
