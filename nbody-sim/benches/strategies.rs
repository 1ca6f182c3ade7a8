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
//! Benchmarks comparing the three execution strategies
//!
//! These benchmarks measure:
//! - Wall time of a short run per strategy for several body counts
//! - Cost of one force evaluation over the full range

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nbody_sim::kernel::compute_accelerations;
use nbody_sim::{
    create_random, run_local_cluster, SequentialSimulator, SharedMemorySimulator, SimConfig,
    Simulator,
};

const STEPS: usize = 5;
const WORKERS: usize = 4;

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategies");
    group.sample_size(10);

    for bodies in [256, 1024, 2048].iter() {
        let config = SimConfig::new(*bodies, STEPS).with_seed(1);
        let initial = create_random(&config).unwrap();
        // One pair interaction per ordered pair per step
        group.throughput(Throughput::Elements((*bodies * *bodies * STEPS) as u64));

        group.bench_with_input(BenchmarkId::new("sequential", bodies), &initial, |b, initial| {
            let mut sim = SequentialSimulator::new(config.clone()).unwrap();
            b.iter(|| {
                let mut state = initial.clone();
                sim.run(&mut state).unwrap();
                black_box(state)
            });
        });

        group.bench_with_input(BenchmarkId::new("shared", bodies), &initial, |b, initial| {
            let mut sim = SharedMemorySimulator::new(config.clone(), WORKERS).unwrap();
            b.iter(|| {
                let mut state = initial.clone();
                sim.run(&mut state).unwrap();
                black_box(state)
            });
        });

        group.bench_with_input(BenchmarkId::new("distributed", bodies), &config, |b, config| {
            b.iter(|| {
                let state =
                    run_local_cluster(config, WORKERS, || create_random(config), |_, _| {}).unwrap();
                black_box(state)
            });
        });
    }

    group.finish();
}

fn bench_force_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("force_evaluation");

    for bodies in [128, 512, 1024].iter() {
        let config = SimConfig::new(*bodies, 1);
        let params = config.gravity();
        let mut state = create_random(&config).unwrap();
        group.throughput(Throughput::Elements((*bodies * *bodies) as u64));

        group.bench_function(BenchmarkId::from_parameter(bodies), |b| {
            b.iter(|| {
                compute_accelerations(&mut state, 0, *bodies, black_box(&params)).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_strategies, bench_force_evaluation);
criterion_main!(benches);
