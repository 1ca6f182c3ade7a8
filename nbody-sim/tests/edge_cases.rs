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
//! Edge case tests for the kernel, partitioning and the simulators
//!
//! Tests boundary conditions, invalid arguments, and degenerate systems

use nbody_sim::comm::LocalCluster;
use nbody_sim::kernel::{compute_accelerations, integrate, step_range, zero_accelerations};
use nbody_sim::state::partition_range;
use nbody_sim::{
    create_random, max_abs_diff, run_local_cluster, Body, BodyState, Dimension, GravityParams,
    Partition, SequentialSimulator, SharedMemorySimulator, SimConfig, SimError, Simulator,
};

fn line(n: usize) -> BodyState {
    let bodies: Vec<Body> = (0..n)
        .map(|i| Body::new([i as f64, 0.5 * i as f64, 0.0], [0.0, 0.1, 0.0], 1.0))
        .collect();
    BodyState::from_bodies(&bodies, Dimension::Two).unwrap()
}

#[test]
fn test_empty_system_rejected() {
    assert!(matches!(BodyState::new(0, Dimension::Two), Err(SimError::EmptySystem)));
    assert!(matches!(partition_range(0, 4), Err(SimError::EmptySystem)));
    assert!(create_random(&SimConfig::new(0, 10)).is_err());
}

#[test]
fn test_kernel_rejects_bad_ranges() {
    let mut state = line(4);
    let params = GravityParams::default();

    assert!(matches!(
        zero_accelerations(&mut state, 3, 2),
        Err(SimError::RangeOutOfBounds { start: 3, end: 2, len: 4 })
    ));
    assert!(matches!(
        compute_accelerations(&mut state, 0, 5, &params),
        Err(SimError::RangeOutOfBounds { start: 0, end: 5, len: 4 })
    ));
    assert!(matches!(
        integrate(&mut state, 5, 5, 0.01),
        Err(SimError::RangeOutOfBounds { .. })
    ));
    assert!(step_range(&mut state, 2, 1, &params, 0.01).is_err());
}

#[test]
fn test_failed_call_leaves_state_untouched() {
    let mut state = line(4);
    let before = state.clone();
    assert!(step_range(&mut state, 0, 9, &GravityParams::default(), 0.01).is_err());
    assert_eq!(state, before);
}

#[test]
fn test_empty_range_is_noop() {
    let mut state = line(4);
    compute_accelerations(&mut state, 0, 4, &GravityParams::default()).unwrap();
    let before = state.clone();

    zero_accelerations(&mut state, 2, 2).unwrap();
    compute_accelerations(&mut state, 4, 4, &GravityParams::default()).unwrap();
    integrate(&mut state, 0, 0, 0.01).unwrap();
    assert_eq!(state, before);
}

#[test]
fn test_compute_touches_only_its_range() {
    let mut state = line(6);
    compute_accelerations(&mut state, 2, 4, &GravityParams::default()).unwrap();
    for i in 0..6 {
        let touched = state.acceleration(i) != [0.0; 3];
        assert_eq!(touched, (2..4).contains(&i), "body {}", i);
    }
}

#[test]
fn test_zero_workers_rejected() {
    let config = SimConfig::new(4, 1);
    assert!(matches!(partition_range(4, 0), Err(SimError::InvalidWorkerCount)));
    assert!(matches!(
        SharedMemorySimulator::new(config.clone(), 0),
        Err(SimError::InvalidWorkerCount)
    ));
    assert!(matches!(LocalCluster::new(0), Err(SimError::InvalidWorkerCount)));
    assert!(matches!(
        run_local_cluster(&config, 0, || create_random(&config), |_, _| {}),
        Err(SimError::InvalidWorkerCount)
    ));
}

#[test]
fn test_invalid_config_rejected() {
    for config in [
        SimConfig::new(4, 1).with_dt(0.0),
        SimConfig::new(4, 1).with_dt(f64::NAN),
        SimConfig::new(4, 1).with_g(-1.0),
        SimConfig::new(4, 1).with_softening(f64::INFINITY),
    ] {
        assert!(matches!(
            SequentialSimulator::new(config.clone()),
            Err(SimError::InvalidConfig(_))
        ));
        assert!(SharedMemorySimulator::new(config, 2).is_err());
    }
    assert!(matches!(
        SequentialSimulator::new(SimConfig::new(0, 1)),
        Err(SimError::EmptySystem)
    ));
}

#[test]
fn test_partitions_cover_range() {
    for (n, workers) in [(10, 3), (7, 7), (3, 8), (100, 6), (1, 1)] {
        let parts = partition_range(n, workers).unwrap();
        assert_eq!(parts.len(), workers.min(n));
        assert_eq!(parts[0].start(), 0);
        assert_eq!(parts.last().unwrap().end(), n);
        for pair in parts.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start());
        }
        assert!(parts.iter().all(|p| !p.is_empty()));
    }
}

#[test]
fn test_rank_partitions_allow_empty() {
    let parts: Vec<Partition> = (0..5).map(|rank| Partition::for_rank(2, rank, 5).unwrap()).collect();
    assert_eq!(parts.iter().map(Partition::len).sum::<usize>(), 2);
    assert_eq!(parts[4].end(), 2);
    assert!(parts.iter().filter(|p| p.is_empty()).count() >= 3);
}

#[test]
fn test_single_body_with_many_workers() {
    let config = SimConfig::new(1, 5);
    let initial = line(1);

    let mut sequential = initial.clone();
    SequentialSimulator::new(config.clone()).unwrap().run(&mut sequential).unwrap();
    let mut shared = initial.clone();
    SharedMemorySimulator::new(config.clone(), 8).unwrap().run(&mut shared).unwrap();
    let distributed = run_local_cluster(&config, 4, || Ok(line(1)), |_, _| {}).unwrap();

    assert_eq!(sequential.acceleration(0), [0.0; 3]);
    assert_eq!(max_abs_diff(&sequential, &shared).unwrap(), 0.0);
    assert_eq!(max_abs_diff(&sequential, &distributed).unwrap(), 0.0);
}

#[test]
fn test_coincident_bodies_stay_finite() {
    let mut state = BodyState::from_bodies(
        &[
            Body::new([0.5, 0.5, 0.0], [0.0; 3], 3.0),
            Body::new([0.5, 0.5, 0.0], [0.0; 3], 3.0),
        ],
        Dimension::Two,
    )
    .unwrap();
    SequentialSimulator::new(SimConfig::new(2, 3))
        .unwrap()
        .run(&mut state)
        .unwrap();
    assert!(state.x().iter().chain(state.vx()).all(|v| v.is_finite()));
}

#[test]
fn test_planar_run_never_leaves_plane() {
    let mut state = create_random(&SimConfig::new(25, 1)).unwrap();
    SharedMemorySimulator::new(SimConfig::new(25, 20), 4)
        .unwrap()
        .run(&mut state)
        .unwrap();
    assert!(state.z().iter().chain(state.vz()).chain(state.az()).all(|&v| v == 0.0));
}

#[test]
fn test_validator_size_mismatch() {
    assert!(matches!(
        max_abs_diff(&line(3), &line(4)),
        Err(SimError::SizeMismatch { left: 3, right: 4 })
    ));
}
