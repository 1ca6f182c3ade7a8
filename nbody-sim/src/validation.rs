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
//! Cross-strategy comparison
//!
//! Disagreement between strategies is a diagnostic value, not an error: the
//! caller decides what tolerance is acceptable.

use crate::error::{Result, SimError};
use crate::state::BodyState;

/// Largest absolute difference over all position and velocity components
///
/// z and vz are compared only when at least one of the states is 3D. A NaN
/// difference propagates to the result, so a diverged run never compares as
/// within tolerance.
///
/// # Errors
///
/// Returns [`SimError::SizeMismatch`] when the states hold a different
/// number of bodies.
pub fn max_abs_diff(a: &BodyState, b: &BodyState) -> Result<f64> {
    if a.len() != b.len() {
        return Err(SimError::SizeMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    let spatial = a.dimension().is_3d() || b.dimension().is_3d();

    let mut components = vec![
        (a.x(), b.x()),
        (a.y(), b.y()),
        (a.vx(), b.vx()),
        (a.vy(), b.vy()),
    ];
    if spatial {
        components.push((a.z(), b.z()));
        components.push((a.vz(), b.vz()));
    }

    Ok(components
        .into_iter()
        .flat_map(|(left, right)| left.iter().zip(right).map(|(l, r)| (l - r).abs()))
        .fold(0.0, |max, diff| if diff.is_nan() || diff > max { diff } else { max }))
}
