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
//! Semi-implicit (symplectic) Euler integration
//!
//! - v' = v + a*dt
//! - p' = p + v'*dt
//!
//! Position is advanced with the already-updated velocity. Swapping the two
//! lines gives explicit Euler and a different trajectory.

use crate::state::MotionLease;

/// Advance velocities and positions of every body in the lease by `dt`
pub fn integrate_lease(lease: &mut MotionLease<'_>, dt: f64) {
    let spatial = lease.dimension().is_3d();

    for k in 0..lease.len() {
        lease.vx[k] += lease.ax[k] * dt;
        lease.vy[k] += lease.ay[k] * dt;
        if spatial {
            lease.vz[k] += lease.az[k] * dt;
        }

        lease.x[k] += lease.vx[k] * dt;
        lease.y[k] += lease.vy[k] * dt;
        if spatial {
            lease.z[k] += lease.vz[k] * dt;
        }
    }
}
