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
//! # N-Body Simulator
//!
//! Direct-summation Newtonian gravity with three interchangeable execution
//! strategies that produce the same trajectory:
//!
//! - **Sequential**: the reference, one thread over all bodies
//! - **Shared memory**: one state split into disjoint partitions, advanced
//!   in parallel with a barrier after every phase
//! - **Distributed memory**: one replica per worker, positions all-gathered
//!   after every step
//!
//! All strategies share one O(N²) kernel with softening and a semi-implicit
//! Euler integrator, and every body's arithmetic is independent of how the
//! index space is split. The validator can therefore demand exact agreement.
//!
//! ## Example
//!
//! ```rust
//! use nbody_sim::{create_random, max_abs_diff, SequentialSimulator, SharedMemorySimulator};
//! use nbody_sim::{SimConfig, Simulator};
//!
//! let config = SimConfig::new(64, 10).with_seed(3);
//! let mut reference = create_random(&config).unwrap();
//! let mut parallel = reference.clone();
//!
//! SequentialSimulator::new(config.clone()).unwrap().run(&mut reference).unwrap();
//! SharedMemorySimulator::new(config, 4).unwrap().run(&mut parallel).unwrap();
//!
//! assert_eq!(max_abs_diff(&reference, &parallel).unwrap(), 0.0);
//! ```

#![warn(missing_docs)]

/// Collective exchange used by the distributed strategy
pub mod comm;

/// Run configuration
pub mod config;

/// Momentum and energy measurements
pub mod diagnostics;

/// Error type
pub mod error;

/// Initial conditions
pub mod initializers;

/// Force evaluation and time integration
pub mod kernel;

/// Rate-limited progress logging
pub mod progress;

/// Simulation strategies
pub mod simulation;

/// CSV snapshot I/O
pub mod snapshot;

/// Structure-of-arrays body storage
pub mod state;

/// Cross-strategy comparison
pub mod validation;

pub use config::SimConfig;
pub use error::{Result, SimError};
pub use initializers::{create_random, two_body_circular};
pub use kernel::GravityParams;
pub use simulation::{
    run_local_cluster, DistributedSimulator, SequentialSimulator, SharedMemorySimulator, Simulator,
};
pub use state::{Body, BodyState, Dimension, Partition};
pub use validation::max_abs_diff;
