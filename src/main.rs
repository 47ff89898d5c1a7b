use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;

use traveller_common::{OutputFormat, SimulationConfig};
use traveller_grid::Simulation;

/// Command-line arguments for the simulation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional path to a config.toml file (built-in defaults otherwise)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for reproducible runs (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many seconds instead of running until killed
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Snapshot output format: "text" or "json"
    #[arg(long)]
    format: Option<String>,
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();
    let args = Args::parse();

    info!("Starting Traveller Grid simulation...");

    // --- Load Configuration ---
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            SimulationConfig::load(path)?
        }
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.run.seed = Some(seed);
    }
    if let Some(duration_secs) = args.duration_secs {
        config.run.duration_secs = Some(duration_secs);
    }
    if let Some(format) = &args.format {
        config.snapshot.format = format.parse::<OutputFormat>()?;
    }
    config.validate()?;

    let params = config.get_sim_params();
    debug!("Simulation Parameters: {:#?}", params);

    // --- Run ---
    let sim = Simulation::start(params, std::io::stdout())?;
    match config.run_duration() {
        Some(duration) => {
            info!("Running for {:?}.", duration);
            sim.run_for(duration)?;
            info!("Simulation Complete.");
        }
        None => sim.wait()?,
    }

    Ok(())
}
