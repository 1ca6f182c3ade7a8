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
//! Range-scoped physics kernel
//!
//! Three phases make up one step, always in this order and over the same
//! range:
//!
//! 1. [`zero_accelerations`] clears `a` for bodies in `[start, end)`
//! 2. [`compute_accelerations`] writes `a` for bodies in `[start, end)`,
//!    reading positions and masses of *every* body
//! 3. [`integrate`] advances `v` then `p` for bodies in `[start, end)`
//!
//! The range functions validate `0 <= start <= end <= N` and then run the
//! same lease-level routines ([`zero_lease`], [`accumulate_lease`],
//! [`integrate_lease`]) that the parallel strategies call per partition, so
//! every strategy shares one arithmetic path.

mod euler;
mod gravity;

pub use euler::integrate_lease;
pub use gravity::{accumulate_lease, zero_lease, GravityParams};

use crate::error::Result;
use crate::state::{BodyState, Partition};

fn single_partition(state: &BodyState, start: usize, end: usize) -> Result<[Partition; 1]> {
    let range = state.check_range(start, end)?;
    Ok([Partition::new(range.start, range.end)?])
}

/// Set accelerations of bodies in `[start, end)` to zero
///
/// # Errors
///
/// Returns [`SimError::RangeOutOfBounds`](crate::SimError::RangeOutOfBounds)
/// unless `start <= end <= N`.
pub fn zero_accelerations(state: &mut BodyState, start: usize, end: usize) -> Result<()> {
    let parts = single_partition(state, start, end)?;
    let (_, mut leases) = state.acceleration_leases(&parts)?;
    leases.iter_mut().for_each(zero_lease);
    Ok(())
}

/// Compute gravitational accelerations of bodies in `[start, end)`
///
/// Reads positions and masses of all N bodies and writes only the
/// accelerations inside the range. Calling it twice on an unchanged state
/// yields the same accelerations; nothing accumulates across calls.
///
/// # Errors
///
/// Returns [`SimError::RangeOutOfBounds`](crate::SimError::RangeOutOfBounds)
/// unless `start <= end <= N`.
pub fn compute_accelerations(
    state: &mut BodyState,
    start: usize,
    end: usize,
    params: &GravityParams,
) -> Result<()> {
    let parts = single_partition(state, start, end)?;
    let (sources, mut leases) = state.acceleration_leases(&parts)?;
    for lease in &mut leases {
        accumulate_lease(&sources, lease, params);
    }
    Ok(())
}

/// Semi-implicit Euler update of bodies in `[start, end)`
///
/// # Errors
///
/// Returns [`SimError::RangeOutOfBounds`](crate::SimError::RangeOutOfBounds)
/// unless `start <= end <= N`.
pub fn integrate(state: &mut BodyState, start: usize, end: usize, dt: f64) -> Result<()> {
    let parts = single_partition(state, start, end)?;
    let mut leases = state.motion_leases(&parts)?;
    for lease in &mut leases {
        integrate_lease(lease, dt);
    }
    Ok(())
}

/// One full step over `[start, end)`: zero, compute, integrate
pub fn step_range(
    state: &mut BodyState,
    start: usize,
    end: usize,
    params: &GravityParams,
    dt: f64,
) -> Result<()> {
    zero_accelerations(state, start, end)?;
    compute_accelerations(state, start, end, params)?;
    integrate(state, start, end, dt)
}
