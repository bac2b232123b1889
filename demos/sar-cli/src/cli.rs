use std::path::PathBuf;

use clap::Parser;
use sar_core::SimConfig;

/// Command-line arguments for a single SAR swarm run.
///
/// Every simulation parameter can be set from a TOML config file
/// (`--config`), overridden individually on the command line, or left at
/// `SimConfig::default()`. Command-line flags win over the config file.
#[derive(Parser, Debug)]
#[command(name = "sar-cli")]
#[command(about = "Drives a search-and-rescue drone swarm coordination run")]
#[command(version)]
pub struct Args {
    /// Path to a TOML file deserializing into SimConfig
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Grid width in tiles, 5-50
    #[arg(long, env = "SAR_GRID_WIDTH")]
    pub grid_width: Option<u32>,

    /// Grid height in tiles, 5-50
    #[arg(long, env = "SAR_GRID_HEIGHT")]
    pub grid_height: Option<u32>,

    /// Number of drones in the fleet, 2-10
    #[arg(long, env = "SAR_NUM_AGENTS")]
    pub num_agents: Option<u32>,

    /// Number of targets scattered on the grid, 1-20
    #[arg(long, env = "SAR_NUM_TARGETS")]
    pub num_targets: Option<u32>,

    /// Simulated run duration in seconds, 30-600
    #[arg(long, env = "SAR_DURATION_SECONDS")]
    pub duration_seconds: Option<f64>,

    /// RNG seed
    #[arg(long, env = "SAR_SEED")]
    pub seed: Option<u64>,

    /// Simulated seconds per tick, 0.1-2.0
    #[arg(long, env = "SAR_TICK_INTERVAL")]
    pub tick_interval: Option<f64>,

    /// Per-tile detection probability, 0.1-1.0
    #[arg(long, env = "SAR_DETECTION_PROBABILITY")]
    pub detection_probability: Option<f64>,

    /// Run exactly this many ticks instead of the full configured duration
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Write a JSON replay file to this path once the run ends
    #[arg(long, value_name = "PATH")]
    pub replay_out: Option<PathBuf>,
}

impl Args {
    /// Layer the flags the caller actually set on top of `base` (either
    /// `SimConfig::default()` or a loaded config file).
    pub fn apply_overrides(&self, base: SimConfig) -> SimConfig {
        SimConfig {
            grid_width: self.grid_width.unwrap_or(base.grid_width),
            grid_height: self.grid_height.unwrap_or(base.grid_height),
            num_agents: self.num_agents.unwrap_or(base.num_agents),
            num_targets: self.num_targets.unwrap_or(base.num_targets),
            duration_seconds: self.duration_seconds.unwrap_or(base.duration_seconds),
            seed: self.seed.unwrap_or(base.seed),
            tick_interval: self.tick_interval.unwrap_or(base.tick_interval),
            detection_probability: self.detection_probability.unwrap_or(base.detection_probability),
        }
    }
}
