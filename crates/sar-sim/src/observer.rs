//! The observer hook and the full-state snapshot it's handed (§6).

use sar_bus::MessageStats;
use sar_core::{Position, SimConfig, TickCount};
use sar_drone::DroneStatus;
use sar_ground::GroundStats;

/// The subset of `SimulationState` (`environment.py`) exposed every tick.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimState {
    pub tick: TickCount,
    pub elapsed_seconds: f64,
    pub is_running: bool,
    pub is_paused: bool,
    pub targets_found: usize,
    pub coverage_percent: f64,
}

/// Grid-level view handed out with each snapshot. `target_positions` is the
/// discovered subset; `all_targets` is ground truth, included for replay and
/// offline analysis but never fed back into any agent's decision-making.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridSummary {
    pub width: u32,
    pub height: u32,
    pub visited_tiles: Vec<Position>,
    pub target_positions: Vec<Position>,
    pub all_targets: Vec<Position>,
}

/// Everything [`crate::Sim::tick`] knows at the end of a tick, mirroring
/// `environment.py`'s `get_full_state`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FullState {
    pub config: SimConfig,
    pub state: SimState,
    pub agents: Vec<DroneStatus>,
    pub grid: GridSummary,
    pub message_stats: MessageStats,
    pub ground_agent: Option<GroundStats>,
}

/// Callbacks invoked by [`crate::Sim::run`]/[`crate::Sim::run_ticks`] at key
/// points in the tick loop.
///
/// All methods default to no-ops so implementors only override what they
/// need — mirrors the teacher's `SimObserver` shape, generalized from
/// mobility snapshots to the full SAR world state.
pub trait SimObserver {
    /// Called at the very start of each tick, before any agent runs.
    fn on_tick_start(&mut self, _tick: TickCount) {}

    /// Called at the end of each tick, after coverage/metrics are updated.
    fn on_tick_end(&mut self, _tick: TickCount) {}

    /// Called once per tick with the full assembled world state. This is the
    /// hook output writers (replay recording, live dashboards) attach to.
    fn on_state_update(&mut self, _state: &FullState) {}

    /// Called once after the run stops, whether by duration, `stop()`, or
    /// cancellation.
    fn on_sim_end(&mut self, _final_tick: TickCount) {}
}

/// A [`SimObserver`] that does nothing. Use when driving a `Sim` without
/// needing any callbacks.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
