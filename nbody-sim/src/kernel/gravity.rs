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
//! Direct-summation softened gravity
//!
//! # Physics Background
//!
//! Each body i accelerates towards every other body j:
//!
//! **a_i = Σ_{j≠i} G · m_j · (p_j − p_i) / (|p_j − p_i|² + ε²)^{3/2}**
//!
//! The softening length ε bounds the force as two bodies approach
//! coincidence. It is applied the same way in 2D and 3D. See:
//! - Dehnen, W. (2001). "Towards optimal softening in three-dimensional N-body codes"
//! - Aarseth, S. J. (2003). "Gravitational N-Body Simulations"
//!
//! # Reproducibility
//!
//! For a fixed i the sum runs over j = 0..N in index order and every term is
//! evaluated with the same operation sequence. The result for body i is
//! therefore a function of i and the global positions only, not of which
//! lease (or worker) computed it.

use crate::state::{AccelerationLease, BodySources};

/// Gravitational constant and softening length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityParams {
    /// Gravitational constant G
    pub g: f64,
    /// Softening length ε
    pub softening: f64,
}

impl GravityParams {
    /// Create gravity parameters
    pub fn new(g: f64, softening: f64) -> Self {
        GravityParams { g, softening }
    }

    /// ε², added to every squared separation
    pub fn softening_squared(&self) -> f64 {
        self.softening * self.softening
    }
}

impl Default for GravityParams {
    fn default() -> Self {
        GravityParams::new(1.0, 1e-3)
    }
}

/// Set every acceleration in the lease to zero
pub fn zero_lease(lease: &mut AccelerationLease<'_>) {
    lease.ax.fill(0.0);
    lease.ay.fill(0.0);
    lease.az.fill(0.0);
}

/// Overwrite the lease's accelerations with the gravitational pull of every body
pub fn accumulate_lease(
    sources: &BodySources<'_>,
    lease: &mut AccelerationLease<'_>,
    params: &GravityParams,
) {
    let n = sources.len();
    let spatial = sources.dimension().is_3d();
    let eps2 = params.softening_squared();

    for local in 0..lease.len() {
        let i = lease.start() + local;
        let xi = sources.x[i];
        let yi = sources.y[i];
        let zi = if spatial { sources.z[i] } else { 0.0 };

        let mut ax = 0.0;
        let mut ay = 0.0;
        let mut az = 0.0;

        for j in 0..n {
            if j == i {
                continue;
            }

            let dx = sources.x[j] - xi;
            let dy = sources.y[j] - yi;
            let dz = if spatial { sources.z[j] - zi } else { 0.0 };

            let dist2 = dx * dx + dy * dy + dz * dz + eps2;
            let inv_dist = 1.0 / dist2.sqrt();
            let inv_dist3 = inv_dist * inv_dist * inv_dist;

            let scale = params.g * sources.mass[j] * inv_dist3;
            ax += dx * scale;
            ay += dy * scale;
            if spatial {
                az += dz * scale;
            }
        }

        lease.ax[local] = ax;
        lease.ay[local] = ay;
        lease.az[local] = az;
    }
}
