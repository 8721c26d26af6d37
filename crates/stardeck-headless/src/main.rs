//! Headless bridge simulation.
//!
//! Spawns the demo solar system with one autopiloted ship, runs the engine
//! and streams snapshots to stdout as JSON lines.
//!
//! ```sh
//! RUST_LOG=debug stardeck-headless --ticks 900 --broadcast-interval-ms 250
//! ```

mod runner;

use std::error::Error;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use stardeck_core::commands::SimCommand;
use stardeck_core::enums::ComponentKind;
use stardeck_core::types::Position;
use stardeck_sim::engine::{SimConfig, SimulationEngine};
use stardeck_sim::world_setup::setup_demo;

use crate::runner::RunOptions;

/// Run the bridge simulation without a frontend.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 300)]
    ticks: u64,

    /// RNG seed. Overrides the seed in `--config`.
    #[arg(long)]
    seed: Option<u64>,

    /// JSON file with a `SimConfig`. Missing fields take their defaults.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Minimum time between snapshot broadcasts.
    #[arg(long, default_value_t = 100)]
    broadcast_interval_ms: u64,

    /// Hold the nominal tick rate instead of running flat out.
    #[arg(long)]
    realtime: bool,

    /// Autopilot destination, km ahead of the ship along its heading.
    #[arg(long, default_value_t = 30_000.0)]
    target_km: f64,
}

fn load_config(cli: &Cli) -> Result<SimConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            SimConfig::from_json(&json)?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    info!(
        "starting headless run: {} ticks, seed {}, {} Hz",
        cli.ticks, config.seed, config.tick_rate
    );

    let mut engine = SimulationEngine::new(config);
    let demo = setup_demo(engine.ecs_mut())?;

    let start = engine
        .ecs()
        .get::<Position>(demo.ship.ship)
        .map(Position::to_vec3)
        .unwrap_or_default();
    let destination = [start.x, start.y, start.z + cli.target_km];
    engine.queue_command(SimCommand::MergeComponent {
        id: demo.ship.ship,
        kind: ComponentKind::Autopilot,
        data: serde_json::json!({
            "desired_coordinates": destination,
            "desired_system": demo.system,
        }),
    });

    let options = RunOptions {
        ticks: cli.ticks,
        broadcast_interval_ms: cli.broadcast_interval_ms,
        realtime: cli.realtime,
    };
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let written = runner::run(&mut engine, &options, &mut out)?;

    let time = engine.time();
    info!(
        "finished at tick {} ({:.1} s simulated), {written} snapshots written",
        time.tick, time.elapsed_secs
    );
    Ok(())
}
