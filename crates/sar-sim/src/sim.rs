//! The `Sim` struct and its tick loop (§4.5).
//!
//! Grounded on `environment.py`'s `SimulationEnvironment`: `init` builds the
//! grid and fleet from a single seed, `tick` runs the exact per-tick order
//! the source describes, and `run`/`run_ticks` step it to completion or a
//! bounded horizon. Unlike the teacher's `dt-sim`, which parallelizes its
//! intent phase behind a `parallel`/Rayon feature, every phase here runs on
//! one logical thread in a fixed order — drones, then Ground, then the
//! allocator — because later phases read state earlier phases just wrote.
//!
//! The tick loop itself is synchronous; the one exception is
//! [`sar_bus::Bus::barrier`], which waits for the bus's background fan-out
//! task to finish routing last tick's publishes into recipient inboxes
//! before this tick reads them. `Sim` hosts a small current-thread runtime
//! purely to bridge that one await — no part of the public API is async.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sar_allocator::allocate::MIN_REALLOC_INTERVAL;
use sar_allocator::{allocate, optimize_for_speed, should_reallocate};
use sar_bus::Bus;
use sar_core::{DroneId, Grid, Position, SimConfig, SimRng, SimTime, TickCount};
use sar_drone::Drone;
use sar_ground::Ground;
use sar_proto::{DetectionOracle, MessagePayload, SimulatedOracle};

use crate::metrics::MetricsTracker;
use crate::observer::{FullState, GridSummary, SimObserver, SimState};
use crate::replay::ReplayFrame;
use crate::{SimError, SimResult};

/// The eight canonical drone start positions `environment.py` cycles
/// through: the four corners plus the midpoint of each edge.
fn canonical_start_positions(width: u32, height: u32) -> [Position; 8] {
    let w = width as i32 - 1;
    let h = height as i32 - 1;
    let mw = width as i32 / 2;
    let mh = height as i32 / 2;
    [
        Position::new(0, 0),
        Position::new(w, 0),
        Position::new(0, h),
        Position::new(w, h),
        Position::new(mw, 0),
        Position::new(0, mh),
        Position::new(w, mh),
        Position::new(mw, h),
    ]
}

/// A cloneable, thread-safe handle for pausing, resuming, or stopping a
/// [`Sim`] from another thread while its `run`/`run_ticks` loop blocks the
/// thread that called it (§5: "`Sim::stop()` sets an `Arc<AtomicBool>`
/// checked between tick steps and after each `sleep`... both are
/// idempotent"). Obtain one with [`Sim::control`] before handing `run` off
/// to the driving thread.
#[derive(Clone)]
pub struct SimControl {
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
}

impl SimControl {
    fn new() -> Self {
        SimControl { running: Arc::new(AtomicBool::new(false)), paused: Arc::new(AtomicBool::new(false)) }
    }

    fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Idempotent: stopping an already-stopped run is a no-op.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

/// The world: grid, fleet, ground controller, bus, and bookkeeping for
/// dynamic reallocation, metrics, and replay recording.
pub struct Sim {
    config: SimConfig,
    bus: Bus,
    runtime: tokio::runtime::Runtime,
    grid: Grid,
    drones: BTreeMap<DroneId, Drone>,
    ground: Ground,
    oracle: Box<dyn DetectionOracle>,
    tick: TickCount,
    elapsed: SimTime,
    control: SimControl,
    ticks_since_reallocation: u64,
    current_allocation: BTreeMap<DroneId, Vec<Position>>,
    metrics: MetricsTracker,
    recording: bool,
    replay_frames: Vec<ReplayFrame>,
}

impl Sim {
    /// Build the world from `config` alone: place targets, place drones,
    /// and hand out the initial zone partition. Uses the default
    /// [`SimulatedOracle`] — use [`Sim::init_with_oracle`] for a custom
    /// detector.
    pub fn init(config: SimConfig) -> SimResult<Sim> {
        Self::init_with_oracle(config, Box::new(SimulatedOracle))
    }

    pub fn init_with_oracle(config: SimConfig, oracle: Box<dyn DetectionOracle>) -> SimResult<Sim> {
        config.validate().map_err(SimError::Config)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SimError::Io)?;

        let mut rng = SimRng::new(config.seed);

        let empty_grid = Grid::new(config.grid_width, config.grid_height, Default::default());
        let mut all_tiles = empty_grid.all_tiles();
        rng.shuffle(&mut all_tiles);
        let target_positions = all_tiles[..config.num_targets as usize].iter().copied().collect();
        let grid = Grid::new(config.grid_width, config.grid_height, target_positions);

        let mut start_positions = canonical_start_positions(config.grid_width, config.grid_height);
        rng.shuffle(&mut start_positions);

        let mut drones = BTreeMap::new();
        let mut drone_positions = BTreeMap::new();
        for i in 0..config.num_agents {
            let id = DroneId(i as u16);
            let position = start_positions[i as usize % start_positions.len()];
            drones.insert(id, Drone::new(id, position, config.seed, config.detection_probability));
            drone_positions.insert(id, position);
        }

        let bus = runtime.block_on(async { Bus::spawn() });
        for &id in drones.keys() {
            bus.register(id);
        }
        bus.register(DroneId::GROUND);

        let batteries: BTreeMap<DroneId, f64> = drone_positions.keys().map(|&id| (id, 100.0)).collect();
        let unvisited_tiles = grid.all_tiles();
        let allocation = allocate(&drone_positions, &unvisited_tiles, &batteries);
        let ordered = optimize_for_speed(&allocation, &drone_positions);
        for (&id, tiles) in &allocation {
            if let Some(drone) = drones.get_mut(&id) {
                drone.assign(tiles, ordered.get(&id).cloned());
            }
        }

        let total_tiles = (config.grid_width * config.grid_height) as usize;
        let num_agents = config.num_agents as usize;
        let num_targets = config.num_targets as usize;

        // Stamped here, not lazily on first `update`/`record_target_found`, so
        // `elapsed_seconds`/`time_to_first_detection` are correct no matter
        // which entry point (`run`, `run_ticks`, or a caller driving `tick`
        // directly) advances the clock first.
        let mut metrics = MetricsTracker::new(num_targets, total_tiles, num_agents);
        metrics.start(SimTime::ZERO);

        Ok(Sim {
            config,
            bus,
            runtime,
            grid,
            drones,
            ground: Ground::new(SimTime::ZERO),
            oracle,
            tick: TickCount::ZERO,
            elapsed: SimTime::ZERO,
            control: SimControl::new(),
            ticks_since_reallocation: 0,
            current_allocation: allocation,
            metrics,
            recording: false,
            replay_frames: Vec::new(),
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn tick_count(&self) -> TickCount {
        self.tick
    }

    pub fn elapsed(&self) -> SimTime {
        self.elapsed
    }

    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.control.is_paused()
    }

    /// A cloneable handle for pausing, resuming, or stopping this run from
    /// another thread while `run`/`run_ticks` blocks this one.
    pub fn control(&self) -> SimControl {
        self.control.clone()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn drone(&self, id: DroneId) -> Option<&Drone> {
        self.drones.get(&id)
    }

    pub fn ground(&self) -> &Ground {
        &self.ground
    }

    pub fn metrics(&self) -> &MetricsTracker {
        &self.metrics
    }

    pub fn start_recording(&mut self) {
        self.recording = true;
        self.replay_frames.clear();
        self.bus.start_recording();
    }

    pub fn stop_recording(&mut self) {
        self.recording = false;
        self.bus.stop_recording();
    }

    pub fn replay_frames(&self) -> &[ReplayFrame] {
        &self.replay_frames
    }

    /// Every message the bus has delivered since recording was last started,
    /// in publish order (`environment.py::save_replay`'s `"messages"` key).
    /// Only populated while [`Sim::start_recording`] is active — mirrors
    /// [`sar_bus::Bus::message_log`], which this simply forwards.
    pub fn recorded_messages(&self) -> Vec<sar_proto::Message> {
        self.bus.message_log()
    }

    pub fn pause(&mut self) {
        self.control.pause();
    }

    pub fn resume(&mut self) {
        self.control.resume();
    }

    /// Rebuild the world from the original config and seed, discarding all
    /// progress (`environment.py::reset`). Recording on/off state survives
    /// the rebuild; its frames don't. A custom oracle installed via
    /// `init_with_oracle` does not survive a reset — it reverts to the
    /// default `SimulatedOracle`.
    pub fn reset(&mut self) -> SimResult<()> {
        let config = self.config.clone();
        let recording = self.recording;
        *self = Sim::init(config)?;
        self.recording = recording;
        Ok(())
    }

    /// Clear the running flag. `run`/`run_ticks` check it every tick (and
    /// during every paused-tick sleep) and stop as soon as it's cleared,
    /// `config.duration_seconds` elapses, or the tick budget passed to
    /// `run_ticks` is exhausted. Safe to call from another thread via a
    /// handle obtained from [`Sim::control`] while `run` is blocking.
    pub fn stop(&mut self) {
        self.control.stop();
        self.runtime.block_on(self.bus.stop());
    }

    /// Run ticks until `config.duration_seconds` elapses or [`Sim::stop`]/
    /// [`SimControl::stop`] is called, reporting through `observer`. While
    /// paused, sleeps for one `tick_interval` at a time without advancing
    /// the simulated clock, per §5's "paused ticks sleep without advancing
    /// the clock" — a [`SimControl`] handle can flip that flag from another
    /// thread since this call blocks the caller for the whole run.
    pub fn run(&mut self, observer: &mut dyn SimObserver) -> SimResult<()> {
        self.control.start();
        self.metrics.start(self.elapsed);

        while self.control.is_running() {
            if self.control.is_paused() {
                std::thread::sleep(Duration::from_secs_f64(self.config.tick_interval));
                continue;
            }
            if self.elapsed.since(SimTime::ZERO) >= self.config.duration_seconds {
                self.control.stop();
                break;
            }
            self.tick(observer)?;
        }

        observer.on_sim_end(self.tick);
        Ok(())
    }

    /// Run until `n` ticks have actually completed (fewer if the duration
    /// elapses or `stop` fires mid-run), reporting through `observer`. Does
    /// not call `on_sim_end` — callers driving ticks manually in a loop call
    /// it themselves once they're done. Pausing (via [`Sim::pause`] or a
    /// [`SimControl`] handle) sleeps between checks without consuming the
    /// tick budget or advancing the clock, same as [`Sim::run`].
    pub fn run_ticks(&mut self, n: u64, observer: &mut dyn SimObserver) -> SimResult<()> {
        self.control.start();
        let mut completed = 0;
        while completed < n && self.control.is_running() {
            if self.control.is_paused() {
                std::thread::sleep(Duration::from_secs_f64(self.config.tick_interval));
                continue;
            }
            if self.elapsed.since(SimTime::ZERO) >= self.config.duration_seconds {
                self.control.stop();
                break;
            }
            self.tick(observer)?;
            completed += 1;
        }
        Ok(())
    }

    /// One simulated step, in the order `environment.py::start`'s loop body
    /// runs it: drive every drone, drive Ground, push snapshots to Ground,
    /// union visited tiles into the grid, maybe reallocate, recompute
    /// coverage, notify the observer, maybe record.
    pub fn tick(&mut self, observer: &mut dyn SimObserver) -> SimResult<()> {
        observer.on_tick_start(self.tick);

        // Let the bus finish routing last tick's publishes into recipient
        // inboxes before this tick's `take_inbox` calls read them.
        self.runtime.block_on(self.bus.barrier())?;

        let peer_positions: BTreeMap<DroneId, Position> =
            self.drones.iter().map(|(&id, d)| (id, d.position())).collect();

        let mut emitted_kinds = Vec::new();
        let mut target_found_this_tick = false;

        for (&id, drone) in self.drones.iter_mut() {
            for message in self.bus.take_inbox(id) {
                drone.deliver(message);
            }
            let emitted = drone.tick(self.elapsed, &self.grid, self.oracle.as_ref(), &peer_positions, &self.bus)?;
            for message in &emitted {
                emitted_kinds.push(message.kind());
                if let MessagePayload::TargetFound { .. } = &message.payload {
                    target_found_this_tick = true;
                }
            }
        }

        for message in self.bus.take_inbox(DroneId::GROUND) {
            self.ground.deliver(message);
        }
        let ground_emitted = self.ground.tick(self.elapsed, &self.bus)?;
        for message in &ground_emitted {
            emitted_kinds.push(message.kind());
        }

        for drone in self.drones.values() {
            for &pos in drone.visited_tiles() {
                self.grid.mark_visited(pos);
            }
        }
        for drone in self.drones.values() {
            self.ground.observe_snapshot(self.elapsed, &drone.snapshot());
        }

        self.ticks_since_reallocation += 1;
        let batteries: BTreeMap<DroneId, f64> =
            self.drones.iter().map(|(&id, d)| (id, d.battery())).collect();
        if should_reallocate(
            &self.current_allocation,
            &batteries,
            self.ticks_since_reallocation,
            MIN_REALLOC_INTERVAL,
        ) {
            let visited = self.grid.visited_tiles();
            let unvisited: Vec<Position> =
                self.grid.all_tiles().into_iter().filter(|p| !visited.contains(p)).collect();
            let positions: BTreeMap<DroneId, Position> =
                self.drones.iter().map(|(&id, d)| (id, d.position())).collect();
            let allocation = allocate(&positions, &unvisited, &batteries);
            let ordered = optimize_for_speed(&allocation, &positions);
            for (&id, tiles) in &allocation {
                if !tiles.is_empty() {
                    if let Some(drone) = self.drones.get_mut(&id) {
                        drone.reassign(tiles, ordered.get(&id).cloned());
                    }
                }
            }
            self.current_allocation = allocation;
            self.ticks_since_reallocation = 0;
        }

        self.ground.update_coverage(&self.grid);

        for kind in emitted_kinds {
            self.metrics.record_message(kind);
        }
        if target_found_this_tick {
            self.metrics.record_target_found(self.elapsed);
        }

        let drone_statuses: Vec<sar_drone::DroneStatus> =
            self.drones.values().map(Drone::snapshot).collect();
        let targets_found = self.ground.discovered_targets().len();
        self.metrics.update(
            self.tick,
            self.elapsed,
            &drone_statuses,
            self.grid.visited_tiles().len(),
            targets_found,
            &self.bus.stats(),
        );

        let state = FullState {
            config: self.config.clone(),
            state: SimState {
                tick: self.tick,
                elapsed_seconds: self.elapsed.since(SimTime::ZERO),
                is_running: self.control.is_running(),
                is_paused: self.control.is_paused(),
                targets_found,
                coverage_percent: self.grid.coverage_percent(),
            },
            agents: drone_statuses,
            grid: GridSummary {
                width: self.grid.width(),
                height: self.grid.height(),
                visited_tiles: self.grid.visited_tiles().iter().copied().collect(),
                target_positions: self.ground.discovered_targets().iter().copied().collect(),
                all_targets: self.grid.target_positions().iter().copied().collect(),
            },
            message_stats: self.bus.stats(),
            ground_agent: Some(self.ground.stats().clone()),
        };
        observer.on_state_update(&state);

        if self.recording {
            self.replay_frames.push(ReplayFrame {
                tick: self.tick,
                timestamp: self.elapsed.since(SimTime::ZERO),
                state,
            });
        }

        self.tick = self.tick.next();
        self.elapsed = self.elapsed.advance(self.config.tick_interval);
        observer.on_tick_end(self.tick);

        Ok(())
    }
}
