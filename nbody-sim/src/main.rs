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
//! `nbody-sim` command line driver
//!
//! Runs one strategy, or all three from the same seeded initial state and
//! checks that they agree.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;
use nbody_sim::diagnostics::{total_energy, total_momentum};
use nbody_sim::snapshot::{snapshot_path, write_snapshot_file};
use nbody_sim::{
    create_random, max_abs_diff, run_local_cluster, BodyState, Dimension, SequentialSimulator,
    SharedMemorySimulator, SimConfig, SimError, Simulator,
};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::thread::available_parallelism;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Single thread, the reference trajectory
    Sequential,
    /// Rayon thread pool over one shared state
    Shared,
    /// One replica per rank, positions all-gathered every step
    Distributed,
    /// Run all three and compare them
    Compare,
}

impl Strategy {
    fn name(self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::Shared => "shared",
            Strategy::Distributed => "distributed",
            Strategy::Compare => "compare",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "nbody-sim", version, about = "Direct-summation N-body gravity simulator")]
struct Args {
    /// Execution strategy
    #[arg(long, value_enum, default_value_t = Strategy::Compare)]
    strategy: Strategy,

    /// Worker count for the parallel strategies (default: available parallelism)
    #[arg(long)]
    workers: Option<usize>,

    /// YAML scenario file; the flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of bodies
    #[arg(long)]
    bodies: Option<usize>,

    /// Number of integration steps
    #[arg(long)]
    steps: Option<usize>,

    /// Time step
    #[arg(long)]
    dt: Option<f64>,

    /// Seed for the random initial state
    #[arg(long)]
    seed: Option<u64>,

    /// Simulate in three dimensions
    #[arg(long)]
    three_d: bool,

    /// Write a snapshot every N steps (0 disables snapshots)
    #[arg(long)]
    snapshot_every: Option<usize>,

    /// Directory that receives snapshot CSV files
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Largest acceptable difference between strategies in compare mode
    #[arg(long, default_value_t = 1e-9)]
    tolerance: f64,

    /// off, error, warn, info, debug or trace
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn initialize_logging(level: LevelFilter) -> Result<()> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%H:%M:%S%.3f)} {h({l:<5})} [{T}] {m}{n}",
        )))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))?;

    log4rs::init_config(config)?;
    Ok(())
}

fn load_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => SimConfig::from_yaml_file(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => SimConfig::default(),
    };

    if let Some(bodies) = args.bodies {
        config.bodies = bodies;
    }
    if let Some(steps) = args.steps {
        config.steps = steps;
    }
    if let Some(dt) = args.dt {
        config.dt = dt;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.three_d {
        config.dimension = Dimension::Three;
    }
    if let Some(every) = args.snapshot_every {
        config.snapshot_every = every;
    }
    if let Some(dir) = &args.snapshot_dir {
        config.snapshot_dir = dir.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Observer that writes cadence snapshots and keeps the first write error
fn snapshot_writer<'a>(
    config: &'a SimConfig,
    strategy: &'a str,
    failure: &'a mut Option<SimError>,
) -> impl FnMut(usize, &BodyState) + Send + 'a {
    move |step, state| {
        if failure.is_some() || !config.is_snapshot_step(step) {
            return;
        }
        let path = snapshot_path(&config.snapshot_dir, strategy, Some(step));
        if let Err(e) = write_snapshot_file(&path, state) {
            *failure = Some(e);
        }
    }
}

fn execute(
    strategy: Strategy,
    config: &SimConfig,
    workers: usize,
    initial: &BodyState,
) -> Result<(BodyState, Duration)> {
    let name = strategy.name();
    let mut failure = None;
    let started = Instant::now();

    let state = {
        let mut observer = snapshot_writer(config, name, &mut failure);
        match strategy {
            Strategy::Sequential => {
                let mut state = initial.clone();
                SequentialSimulator::new(config.clone())?.run_observed(&mut state, &mut observer)?;
                state
            }
            Strategy::Shared => {
                let mut state = initial.clone();
                SharedMemorySimulator::new(config.clone(), workers)?
                    .run_observed(&mut state, &mut observer)?;
                state
            }
            Strategy::Distributed => {
                run_local_cluster(config, workers, || create_random(config), observer)?
            }
            Strategy::Compare => bail!("compare is not a single strategy"),
        }
    };
    let elapsed = started.elapsed();

    if let Some(e) = failure {
        return Err(e).context("writing snapshot");
    }
    if config.snapshot_every > 0 {
        let path = snapshot_path(&config.snapshot_dir, name, None);
        write_snapshot_file(&path, &state)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    info!("{}: {:.3} s", name, elapsed.as_secs_f64());
    Ok((state, elapsed))
}

fn report_conservation(config: &SimConfig, initial: &BodyState, last: &BodyState) {
    let params = config.gravity();
    let (e0, e1) = (total_energy(initial, &params), total_energy(last, &params));
    let p = total_momentum(last);
    info!(
        "energy {:.6e} -> {:.6e} (relative drift {:.3e}), momentum [{:.3e}, {:.3e}, {:.3e}]",
        e0,
        e1,
        ((e1 - e0) / e0).abs(),
        p[0],
        p[1],
        p[2]
    );
}

fn compare(config: &SimConfig, workers: usize, initial: &BodyState, tolerance: f64) -> Result<()> {
    let (sequential, t_seq) = execute(Strategy::Sequential, config, workers, initial)?;
    let (shared, t_shared) = execute(Strategy::Shared, config, workers, initial)?;
    let (distributed, t_dist) = execute(Strategy::Distributed, config, workers, initial)?;

    let shared_diff = max_abs_diff(&sequential, &shared)?;
    let distributed_diff = max_abs_diff(&sequential, &distributed)?;
    info!("max |sequential - shared|      = {:e}", shared_diff);
    info!("max |sequential - distributed| = {:e}", distributed_diff);
    info!(
        "speedup: shared {:.2}x, distributed {:.2}x",
        t_seq.as_secs_f64() / t_shared.as_secs_f64(),
        t_seq.as_secs_f64() / t_dist.as_secs_f64()
    );
    report_conservation(config, initial, &sequential);

    // Written so that NaN fails the check
    if !(shared_diff <= tolerance && distributed_diff <= tolerance) {
        bail!(
            "strategies disagree: shared {:e}, distributed {:e}, tolerance {:e}",
            shared_diff,
            distributed_diff,
            tolerance
        );
    }
    info!("strategies agree within {:e}", tolerance);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level: LevelFilter = args
        .log_level
        .parse()
        .map_err(|_| anyhow!("unknown log level `{}`", args.log_level))?;
    initialize_logging(level)?;

    let config = load_config(&args)?;
    let workers = match args.workers {
        Some(workers) => workers,
        None => available_parallelism().map(NonZeroUsize::get).unwrap_or(1),
    };
    if workers == 0 {
        bail!(SimError::InvalidWorkerCount);
    }
    if config.steps == 0 {
        warn!("steps = 0: nothing to simulate");
    }
    info!(
        "{} bodies ({:?}), {} steps, dt = {}, seed = {}, {} workers",
        config.bodies, config.dimension, config.steps, config.dt, config.seed, workers
    );

    let initial = create_random(&config)?;
    match args.strategy {
        Strategy::Compare => compare(&config, workers, &initial, args.tolerance),
        single => {
            let (last, _) = execute(single, &config, workers, &initial)?;
            report_conservation(&config, &initial, &last);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_every_flag_has_help() {
        let command = Args::command();
        for arg in command.get_arguments() {
            assert!(arg.get_help().is_some(), "--{} has no help text", arg.get_id());
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from(["nbody-sim", "--bodies", "12", "--steps", "3", "--three-d"]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.bodies, 12);
        assert_eq!(config.steps, 3);
        assert_eq!(config.dimension, Dimension::Three);
    }
}
