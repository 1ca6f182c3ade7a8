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
//! Structure-of-Arrays body storage
//!
//! [`BodyState`] keeps every per-body quantity in its own contiguous
//! `Vec<f64>`, index-aligned across all ten arrays:
//!
//! ```text
//! x:    [x0, x1, x2, ...]
//! y:    [y0, y1, y2, ...]
//! ...
//! mass: [m0, m1, m2, ...]
//! ```
//!
//! # Leases
//!
//! Parallel phases never share a `&mut BodyState`. Instead the state is split,
//! for an ordered list of disjoint [`Partition`]s, into per-partition leases
//! that borrow exclusive sub-slices of exactly the arrays the phase writes:
//!
//! - [`BodyState::acceleration_leases`] hands out a shared [`BodySources`]
//!   view (positions and masses of every body) together with one
//!   [`AccelerationLease`] per partition.
//! - [`BodyState::motion_leases`] hands out one [`MotionLease`] per partition
//!   covering positions and velocities, with read-only accelerations.
//!
//! The borrow checker guarantees that no two leases alias and that nobody
//! writes positions while a `BodySources` view is alive.

mod partition;

pub use partition::{partition_range, Partition};
pub(crate) use partition::check_partitions;

use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Spatial dimensionality of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dimension {
    /// Planar dynamics; z components are held at exactly 0.0
    #[default]
    #[serde(rename = "2d")]
    Two,
    /// Full three-dimensional dynamics
    #[serde(rename = "3d")]
    Three,
}

impl Dimension {
    /// Whether z components take part in the physics
    pub fn is_3d(self) -> bool {
        matches!(self, Dimension::Three)
    }
}

/// Value snapshot of a single body
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Body {
    /// Position (x, y, z)
    pub position: [f64; 3],
    /// Velocity (vx, vy, vz)
    pub velocity: [f64; 3],
    /// Mass
    pub mass: f64,
}

impl Body {
    /// Create a body from position, velocity and mass
    pub fn new(position: [f64; 3], velocity: [f64; 3], mass: f64) -> Self {
        Body { position, velocity, mass }
    }
}

/// The full system of N bodies at one instant
///
/// All arrays have length N. In 2D mode `z`, `vz` and `az` are exactly 0.0
/// for every body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyState {
    dimension: Dimension,
    pub(crate) x: Vec<f64>,
    pub(crate) y: Vec<f64>,
    pub(crate) z: Vec<f64>,
    pub(crate) vx: Vec<f64>,
    pub(crate) vy: Vec<f64>,
    pub(crate) vz: Vec<f64>,
    pub(crate) ax: Vec<f64>,
    pub(crate) ay: Vec<f64>,
    pub(crate) az: Vec<f64>,
    pub(crate) mass: Vec<f64>,
}

impl BodyState {
    /// Create a state of `n` bodies at rest at the origin with zero mass
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EmptySystem`] when `n == 0`.
    pub fn new(n: usize, dimension: Dimension) -> Result<Self> {
        if n == 0 {
            return Err(SimError::EmptySystem);
        }
        Ok(BodyState {
            dimension,
            x: vec![0.0; n],
            y: vec![0.0; n],
            z: vec![0.0; n],
            vx: vec![0.0; n],
            vy: vec![0.0; n],
            vz: vec![0.0; n],
            ax: vec![0.0; n],
            ay: vec![0.0; n],
            az: vec![0.0; n],
            mass: vec![0.0; n],
        })
    }

    /// Build a state from a list of bodies
    pub fn from_bodies(bodies: &[Body], dimension: Dimension) -> Result<Self> {
        let mut state = Self::new(bodies.len(), dimension)?;
        for (i, body) in bodies.iter().enumerate() {
            state.set_body(i, *body)?;
        }
        Ok(state)
    }

    /// Number of bodies
    pub fn len(&self) -> usize {
        self.mass.len()
    }

    /// Always false: a state holds at least one body
    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }

    /// Dimensionality of the state
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Validate `[start, end)` against the body count
    ///
    /// # Errors
    ///
    /// Returns [`SimError::RangeOutOfBounds`] unless `start <= end <= N`.
    pub fn check_range(&self, start: usize, end: usize) -> Result<Range<usize>> {
        let len = self.len();
        if start > end || end > len {
            return Err(SimError::RangeOutOfBounds { start, end, len });
        }
        Ok(start..end)
    }

    /// Read body `index`
    pub fn body(&self, index: usize) -> Option<Body> {
        if index >= self.len() {
            return None;
        }
        Some(Body {
            position: [self.x[index], self.y[index], self.z[index]],
            velocity: [self.vx[index], self.vy[index], self.vz[index]],
            mass: self.mass[index],
        })
    }

    /// Overwrite position, velocity and mass of body `index`
    ///
    /// In 2D mode the z position and velocity are stored as 0.0 whatever the
    /// caller passes. The acceleration of the body is left untouched.
    pub fn set_body(&mut self, index: usize, body: Body) -> Result<()> {
        self.check_range(index, index + 1)?;
        let planar = !self.dimension.is_3d();
        self.x[index] = body.position[0];
        self.y[index] = body.position[1];
        self.z[index] = if planar { 0.0 } else { body.position[2] };
        self.vx[index] = body.velocity[0];
        self.vy[index] = body.velocity[1];
        self.vz[index] = if planar { 0.0 } else { body.velocity[2] };
        self.mass[index] = body.mass;
        Ok(())
    }

    /// Iterate over all bodies in index order
    pub fn bodies(&self) -> impl Iterator<Item = Body> + '_ {
        (0..self.len()).filter_map(move |i| self.body(i))
    }

    /// Position (x, y, z) of body `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn position(&self, index: usize) -> [f64; 3] {
        [self.x[index], self.y[index], self.z[index]]
    }

    /// Velocity (vx, vy, vz) of body `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn velocity(&self, index: usize) -> [f64; 3] {
        [self.vx[index], self.vy[index], self.vz[index]]
    }

    /// Acceleration (ax, ay, az) of body `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn acceleration(&self, index: usize) -> [f64; 3] {
        [self.ax[index], self.ay[index], self.az[index]]
    }

    /// x positions
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// y positions
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// z positions
    pub fn z(&self) -> &[f64] {
        &self.z
    }

    /// x velocities
    pub fn vx(&self) -> &[f64] {
        &self.vx
    }

    /// y velocities
    pub fn vy(&self) -> &[f64] {
        &self.vy
    }

    /// z velocities
    pub fn vz(&self) -> &[f64] {
        &self.vz
    }

    /// x accelerations
    pub fn ax(&self) -> &[f64] {
        &self.ax
    }

    /// y accelerations
    pub fn ay(&self) -> &[f64] {
        &self.ay
    }

    /// z accelerations
    pub fn az(&self) -> &[f64] {
        &self.az
    }

    /// Masses
    pub fn mass(&self) -> &[f64] {
        &self.mass
    }

    /// Read view over positions and masses of every body
    pub fn sources(&self) -> BodySources<'_> {
        BodySources {
            dimension: self.dimension,
            x: &self.x,
            y: &self.y,
            z: &self.z,
            mass: &self.mass,
        }
    }

    /// Split the state for the acceleration phases
    ///
    /// Returns a shared view of every position and mass plus one exclusive
    /// acceleration lease per partition, in partition order.
    ///
    /// # Errors
    ///
    /// Fails if a partition exceeds the body count or if the partitions are
    /// not ordered and disjoint.
    pub fn acceleration_leases(
        &mut self,
        parts: &[Partition],
    ) -> Result<(BodySources<'_>, Vec<AccelerationLease<'_>>)> {
        check_partitions(parts, self.len())?;
        let BodyState { dimension, x, y, z, ax, ay, az, mass, .. } = self;

        let leases = parts
            .iter()
            .zip(split_triple_mut(ax, ay, az, parts))
            .map(|(part, [ax, ay, az])| AccelerationLease {
                start: part.start(),
                dimension: *dimension,
                ax,
                ay,
                az,
            })
            .collect();

        let sources = BodySources {
            dimension: *dimension,
            x,
            y,
            z,
            mass,
        };
        Ok((sources, leases))
    }

    /// Split the state for the integration phase
    ///
    /// # Errors
    ///
    /// Fails if a partition exceeds the body count or if the partitions are
    /// not ordered and disjoint.
    pub fn motion_leases(&mut self, parts: &[Partition]) -> Result<Vec<MotionLease<'_>>> {
        check_partitions(parts, self.len())?;
        let BodyState { dimension, x, y, z, vx, vy, vz, ax, ay, az, .. } = self;
        let dimension = *dimension;
        let (ax, ay, az): (&[f64], &[f64], &[f64]) = (ax, ay, az);

        let leases = parts
            .iter()
            .zip(split_triple_mut(x, y, z, parts))
            .zip(split_triple_mut(vx, vy, vz, parts))
            .map(|((part, [x, y, z]), [vx, vy, vz])| {
                let range = part.range();
                MotionLease {
                    start: part.start(),
                    dimension,
                    x,
                    y,
                    z,
                    vx,
                    vy,
                    vz,
                    ax: &ax[range.clone()],
                    ay: &ay[range.clone()],
                    az: &az[range],
                }
            })
            .collect();
        Ok(leases)
    }
}

/// Shared read view of positions and masses for the whole body set
#[derive(Debug, Clone, Copy)]
pub struct BodySources<'a> {
    dimension: Dimension,
    /// x positions of every body
    pub x: &'a [f64],
    /// y positions of every body
    pub y: &'a [f64],
    /// z positions of every body
    pub z: &'a [f64],
    /// Masses of every body
    pub mass: &'a [f64],
}

impl BodySources<'_> {
    /// Dimensionality of the underlying state
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Number of bodies in view
    pub fn len(&self) -> usize {
        self.mass.len()
    }

    /// Whether the view is empty
    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }
}

/// Exclusive access to the accelerations of one partition
#[derive(Debug)]
pub struct AccelerationLease<'a> {
    start: usize,
    dimension: Dimension,
    pub(crate) ax: &'a mut [f64],
    pub(crate) ay: &'a mut [f64],
    pub(crate) az: &'a mut [f64],
}

impl AccelerationLease<'_> {
    /// Global index of the first leased body
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of leased bodies
    pub fn len(&self) -> usize {
        self.ax.len()
    }

    /// Whether the lease covers no bodies
    pub fn is_empty(&self) -> bool {
        self.ax.is_empty()
    }

    /// Dimensionality of the underlying state
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }
}

/// Exclusive access to positions and velocities of one partition
#[derive(Debug)]
pub struct MotionLease<'a> {
    start: usize,
    dimension: Dimension,
    pub(crate) x: &'a mut [f64],
    pub(crate) y: &'a mut [f64],
    pub(crate) z: &'a mut [f64],
    pub(crate) vx: &'a mut [f64],
    pub(crate) vy: &'a mut [f64],
    pub(crate) vz: &'a mut [f64],
    pub(crate) ax: &'a [f64],
    pub(crate) ay: &'a [f64],
    pub(crate) az: &'a [f64],
}

impl MotionLease<'_> {
    /// Global index of the first leased body
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of leased bodies
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the lease covers no bodies
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Dimensionality of the underlying state
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }
}

/// Carve `slice` into one sub-slice per partition; partitions must be checked
fn split_mut<'a>(slice: &'a mut [f64], parts: &[Partition]) -> Vec<&'a mut [f64]> {
    let mut chunks = Vec::with_capacity(parts.len());
    let mut rest = slice;
    let mut offset = 0;
    for part in parts {
        let tail = std::mem::take(&mut rest);
        let (_, tail) = tail.split_at_mut(part.start() - offset);
        let (chunk, tail) = tail.split_at_mut(part.len());
        chunks.push(chunk);
        rest = tail;
        offset = part.end();
    }
    chunks
}

fn split_triple_mut<'a>(
    a: &'a mut [f64],
    b: &'a mut [f64],
    c: &'a mut [f64],
    parts: &[Partition],
) -> Vec<[&'a mut [f64]; 3]> {
    split_mut(a, parts)
        .into_iter()
        .zip(split_mut(b, parts))
        .zip(split_mut(c, parts))
        .map(|((a, b), c)| [a, b, c])
        .collect()
}
