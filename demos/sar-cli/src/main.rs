//! `sar-cli` — drives the SAR swarm coordination engine from the command
//! line, wiring together `sar-core`'s config, `sar-sim`'s driver, and
//! `sar-output`'s JSON replay writer the way `rust_dt`'s `examples/xsmall`
//! wires `dt-sim` and `dt-output` for its own scenario binary.

use std::path::PathBuf;

use clap::Parser;
use sar_core::SimConfig;
use sar_sim::{NoopObserver, Sim};
use tracing_subscriber::EnvFilter;

mod cli;
mod error;

use cli::Args;
use error::{CliError, CliResult};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run(Args::parse()) {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> CliResult<()> {
    let config = load_config(&args)?;

    tracing::info!(
        grid = format!("{}x{}", config.grid_width, config.grid_height),
        agents = config.num_agents,
        targets = config.num_targets,
        seed = config.seed,
        "starting run"
    );

    let mut sim = Sim::init(config)?;

    if let Some(replay_path) = &args.replay_out {
        run_recorded(&mut sim, &args, replay_path)?;
    } else if let Some(ticks) = args.ticks {
        sim.run_ticks(ticks, &mut NoopObserver)?;
    } else {
        sim.run(&mut NoopObserver)?;
    }

    report(&sim);
    Ok(())
}

fn run_recorded(sim: &mut Sim, args: &Args, replay_path: &PathBuf) -> CliResult<()> {
    sim.start_recording();
    if let Some(ticks) = args.ticks {
        sim.run_ticks(ticks, &mut NoopObserver)?;
    } else {
        sim.run(&mut NoopObserver)?;
    }
    sim.stop_recording();

    sar_output::save_replay(replay_path, sim.config(), sim.recorded_messages(), sim.replay_frames())?;
    tracing::info!(path = %replay_path.display(), frames = sim.replay_frames().len(), "replay written");
    Ok(())
}

fn report(sim: &Sim) {
    let Some(summary) = sim.metrics().summary() else {
        tracing::warn!("no ticks ran; nothing to report");
        return;
    };
    tracing::info!(
        ticks = sim.tick_count().0,
        elapsed = sim.elapsed().0,
        coverage_percent = summary.coverage_percent,
        targets_found = summary.targets_found,
        handoffs = summary.handoffs,
        messages_sent = summary.messages_sent,
        drones_active = summary.active_agents,
        "run finished"
    );
}

fn load_config(args: &Args) -> CliResult<SimConfig> {
    let Some(path) = &args.config else {
        return Ok(args.apply_overrides(SimConfig::default()));
    };
    let text = std::fs::read_to_string(path).map_err(|e| CliError::ConfigFile(path.clone(), e))?;
    let config: SimConfig = toml::from_str(&text).map_err(|e| CliError::ConfigParse(path.clone(), e))?;
    Ok(args.apply_overrides(config))
}
