#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Horde arena match.

mod config;
mod simulation;
mod stage;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{config::HordeConfig, simulation::Simulation};

/// Headless arena simulation: spawns hordes around a patrolling player.
#[derive(Debug, Parser)]
#[command(name = "horde", version)]
struct Cli {
    /// TOML file overriding the shipped tuning.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Simulated seconds to run for.
    #[arg(long, default_value_t = 120.0)]
    duration: f32,
    /// Length of one simulation frame in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Seed for every random stream in the simulation.
    #[arg(long, default_value_t = 0x5eed_1e55)]
    seed: u64,
    /// Distance at which the player takes down an enemy.
    #[arg(long, default_value_t = 2.5)]
    kill_radius: f32,
    /// Release waves every 0.1 s instead of the ramped cadence.
    #[arg(long)]
    fast_spawn: bool,
}

/// Entry point for the Horde command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = HordeConfig::load(cli.config.as_deref())
        .context("failed to load simulation configuration")?;
    if cli.fast_spawn {
        config.pacing.fast_spawn = true;
    }
    if cli.tick_ms == 0 {
        bail!("--tick-ms must be at least 1");
    }
    let total = Duration::try_from_secs_f32(cli.duration)
        .context("--duration must be a non-negative number of seconds")?;
    let dt = Duration::from_millis(cli.tick_ms);

    info!(
        seed = cli.seed,
        duration_secs = cli.duration,
        tick_ms = cli.tick_ms,
        "starting horde simulation"
    );
    let mut simulation = Simulation::new(&config, cli.kill_radius, cli.seed);
    while simulation.elapsed() < total && !simulation.is_over() {
        simulation.step(dt);
    }

    let summary = simulation.summary();
    println!(
        "simulated {:.1}s over {} ticks{}",
        summary.simulated.as_secs_f32(),
        summary.ticks,
        if summary.match_over {
            " (match clock ran out)"
        } else {
            ""
        }
    );
    println!(
        "enemies: {} spawned, {} killed, {} despawned, peak population {}",
        summary.spawned, summary.killed, summary.despawned, summary.peak_population
    );
    println!(
        "grannies: {} released, gate fill {:.2}, {} cooldowns",
        summary.grannies,
        simulation.gate_fill(),
        simulation.gate_cooldowns()
    );
    println!("voice lines: {}", summary.voice_lines);
    println!(
        "match clock: {:.1}s granted, {:.1}s remaining",
        summary.time_rewarded, summary.clock_remaining
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
