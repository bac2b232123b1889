use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use sar_bus::Bus;
use sar_core::{DroneId, Grid, Position, SimConfig, SimTime};
use sar_drone::Drone;
use sar_proto::{MessageKind, SimulatedOracle};

use crate::observer::{FullState, NoopObserver, SimObserver};
use crate::Sim;

fn config(grid_width: u32, grid_height: u32, num_agents: u32, num_targets: u32) -> SimConfig {
    SimConfig {
        grid_width,
        grid_height,
        num_agents,
        num_targets,
        duration_seconds: 60.0,
        seed: 7,
        tick_interval: 0.1,
        detection_probability: 1.0,
    }
}

#[test]
fn init_partitions_every_tile_across_the_fleet() {
    let sim = Sim::init(config(10, 10, 4, 3)).unwrap();

    assert_eq!(sim.grid().all_tiles().len(), 100);
    let assigned_total: usize = (0..4)
        .map(|i| sim.drone(DroneId(i)).unwrap().snapshot().assigned_tiles)
        .sum();
    assert_eq!(assigned_total, 100, "the initial allocation must cover every tile exactly once");
    assert_eq!(sim.ground().discovered_targets().len(), 0);
}

#[test]
fn full_coverage_emerges_over_a_run() {
    let mut sim = Sim::init(config(5, 5, 2, 1)).unwrap();
    sim.run_ticks(600, &mut NoopObserver).unwrap();

    assert_eq!(sim.grid().coverage_percent(), 100.0, "two drones on a 5x5 grid must finish covering it within 600 ticks");
}

#[test]
fn single_target_is_discovered_exactly_once() {
    let mut sim = Sim::init(config(6, 6, 2, 1)).unwrap();
    sim.run_ticks(600, &mut NoopObserver).unwrap();

    assert_eq!(sim.ground().discovered_targets().len(), 1);
    let snapshot = sim.metrics().current().expect("at least one tick ran");
    assert_eq!(snapshot.targets_found, 1);
    assert!(sim.metrics().time_to_first_detection().is_some());
}

#[test]
fn fleet_dies_under_continuous_movement_and_ground_notices() {
    // A grid far larger than either drone can finish covering before its
    // battery runs out keeps both drones moving every tick, draining at
    // BATTERY_DRAIN_MOVE until CRITICAL_BATTERY.
    let mut sim = Sim::init(config(30, 30, 2, 1)).unwrap();
    sim.run_ticks(600, &mut NoopObserver).unwrap();

    for i in 0..2 {
        let drone = sim.drone(DroneId(i)).unwrap();
        assert!(drone.is_dead(), "drone {i} should have died after 60s of continuous movement");
    }

    // Both drones stopped heartbeating well before the run ended, so Ground's
    // periodic coordinate() pass should have marked them inactive.
    for i in 0..2 {
        let status = sim.ground().drone_status(DroneId(i)).expect("ground observed this drone");
        assert!(!status.is_active, "drone {i} should be marked inactive after HEARTBEAT_TIMEOUT");
    }
}

#[test]
fn dead_fleet_stops_generating_bus_traffic() {
    let mut sim = Sim::init(config(30, 30, 2, 1)).unwrap();
    sim.run_ticks(400, &mut NoopObserver).unwrap();
    assert!((0..2).all(|i| sim.drone(DroneId(i)).unwrap().is_dead()));

    let sent_at_death = sim.metrics().current().unwrap().messages_sent;
    sim.run_ticks(100, &mut NoopObserver).unwrap();
    let sent_later = sim.metrics().current().unwrap().messages_sent;

    assert_eq!(sent_at_death, sent_later, "a fully dead fleet must not publish any further messages");
}

#[test]
fn recording_produces_one_monotonically_ticked_frame_per_step() {
    let mut sim = Sim::init(config(10, 10, 4, 3)).unwrap();
    sim.start_recording();
    sim.run_ticks(20, &mut NoopObserver).unwrap();

    let frames = sim.replay_frames();
    assert_eq!(frames.len(), 20);
    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(frame.tick.0, i as u64);
    }
}

#[test]
fn stop_recording_halts_accumulation_without_discarding_earlier_frames() {
    let mut sim = Sim::init(config(10, 10, 4, 3)).unwrap();
    sim.start_recording();
    sim.run_ticks(5, &mut NoopObserver).unwrap();
    sim.stop_recording();
    sim.run_ticks(5, &mut NoopObserver).unwrap();

    assert_eq!(sim.replay_frames().len(), 5);
}

/// Pauses the run via a [`crate::SimControl`] handle the first time it sees
/// `pause_at`, mimicking an external controller that decides to pause
/// mid-run. A second thread resumes it shortly after, proving the handle
/// genuinely works across threads rather than only through `Sim::pause`
/// called between ticks on the same thread that owns `&mut Sim`.
struct PauseOnce {
    pause_at: u64,
    paused: bool,
    control: crate::SimControl,
}

impl SimObserver for PauseOnce {
    fn on_tick_start(&mut self, tick: sar_core::TickCount) {
        if !self.paused && tick.0 == self.pause_at {
            self.control.pause();
            self.paused = true;
        }
    }
}

#[test]
fn pause_blocks_progress_until_resumed_from_another_thread() {
    use std::time::{Duration, Instant};

    let mut sim = Sim::init(config(10, 10, 4, 3)).unwrap();
    let resume_handle = sim.control();

    let resumer = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(30));
        resume_handle.resume();
    });

    let mut observer = PauseOnce { pause_at: 3, paused: false, control: sim.control() };
    let started = Instant::now();
    sim.run_ticks(10, &mut observer).unwrap();
    let blocked_for = started.elapsed();

    resumer.join().unwrap();

    assert!(
        blocked_for >= Duration::from_millis(50),
        "run_ticks should have slept through the paused-tick loop until the other thread resumed it, took {blocked_for:?}"
    );
    assert_eq!(sim.tick_count().0, 10, "all 10 ticks should complete once resumed");
}

#[test]
fn stop_via_control_handle_halts_a_blocking_run_and_is_idempotent() {
    let mut sim = Sim::init(SimConfig {
        duration_seconds: 30.0,
        tick_interval: 2.0, // 15 ticks total if left to run to completion
        ..config(10, 10, 4, 3)
    })
    .unwrap();
    let stop_handle = sim.control();

    struct StopAfterOne {
        control: crate::SimControl,
        fired: bool,
    }
    impl SimObserver for StopAfterOne {
        fn on_tick_end(&mut self, _tick: sar_core::TickCount) {
            if !self.fired {
                self.control.stop();
                self.fired = true;
            }
        }
    }

    let mut observer = StopAfterOne { control: stop_handle, fired: false };
    sim.run(&mut observer).unwrap();

    assert_eq!(sim.tick_count().0, 1, "run() must stop right after the first tick once stop() fires");
    assert!(!sim.is_running());

    // stop() is idempotent — calling it again on an already-stopped run must not panic.
    sim.control().stop();
}

#[derive(Default)]
struct CountingObserver {
    starts: u64,
    ends: u64,
    states: u64,
    sim_ends: u64,
}

impl SimObserver for CountingObserver {
    fn on_tick_start(&mut self, _tick: sar_core::TickCount) {
        self.starts += 1;
    }
    fn on_tick_end(&mut self, _tick: sar_core::TickCount) {
        self.ends += 1;
    }
    fn on_state_update(&mut self, _state: &FullState) {
        self.states += 1;
    }
    fn on_sim_end(&mut self, _final_tick: sar_core::TickCount) {
        self.sim_ends += 1;
    }
}

#[test]
fn observer_hooks_fire_once_per_tick() {
    let mut sim = Sim::init(config(10, 10, 4, 3)).unwrap();
    let mut observer = CountingObserver::default();
    sim.run_ticks(15, &mut observer).unwrap();

    assert_eq!(observer.starts, 15);
    assert_eq!(observer.ends, 15);
    assert_eq!(observer.states, 15);
    // run_ticks never calls on_sim_end — only run() does, once the duration
    // or an explicit stop() ends the loop.
    assert_eq!(observer.sim_ends, 0);
}

#[test]
fn reset_rebuilds_the_same_deterministic_world() {
    let mut sim = Sim::init(config(10, 10, 4, 3)).unwrap();
    sim.run_ticks(10, &mut NoopObserver).unwrap();
    sim.reset().unwrap();

    assert_eq!(sim.tick_count().0, 0);
    assert_eq!(sim.elapsed().0, 0.0);
    assert_eq!(sim.grid().visited_tiles().len(), 0);
    assert_eq!(sim.ground().discovered_targets().len(), 0);
}

// --- cross-agent handoff, driven directly through a real Bus ---------------
//
// `sar-drone`'s own tests exercise handoff gating on a single drone in
// isolation; this drives two real `Drone`s through a real `Bus` so the
// request/accept round trip actually crosses the wire.

fn grid(w: u32, h: u32) -> Grid {
    Grid::new(w, h, BTreeSet::new())
}

async fn step(
    bus: &Bus,
    drones: &mut BTreeMap<DroneId, Drone>,
    grid: &Grid,
    oracle: &SimulatedOracle,
) -> Vec<sar_proto::Message> {
    bus.barrier().await.unwrap();
    let peers: BTreeMap<DroneId, Position> = drones.iter().map(|(&id, d)| (id, d.position())).collect();

    let mut emitted = Vec::new();
    for (&id, drone) in drones.iter_mut() {
        for message in bus.take_inbox(id) {
            drone.deliver(message);
        }
        emitted.extend(drone.tick(SimTime(0.0), grid, oracle, &peers, bus).unwrap());
    }
    emitted
}

#[tokio::test]
async fn low_battery_handoff_round_trips_between_two_real_drones() {
    let bus = Bus::spawn();
    let a = DroneId(0);
    let b = DroneId(1);
    bus.register(a);
    bus.register(b);

    let mut drones = BTreeMap::new();
    // A single far tile keeps drone A moving (and draining at
    // BATTERY_DRAIN_MOVE) every tick instead of idling once it arrives.
    let mut drone_a = Drone::new(a, Position::new(0, 0), 1, 0.3);
    drone_a.assign(&[Position::new(9, 0)], None);
    drones.insert(a, drone_a);
    drones.insert(b, Drone::new(b, Position::new(9, 9), 2, 0.3));

    let g = grid(10, 10);
    let oracle = SimulatedOracle;

    let mut saw_handoff_request = false;
    let mut saw_accept_handoff = false;
    for _ in 0..2000 {
        let emitted = step(&bus, &mut drones, &g, &oracle).await;
        saw_handoff_request |= emitted.iter().any(|m| m.kind() == MessageKind::HandoffRequest);
        saw_accept_handoff |= emitted.iter().any(|m| m.kind() == MessageKind::AcceptHandoff);
        if saw_accept_handoff {
            break;
        }
    }

    assert!(saw_handoff_request, "drone A should have requested a handoff below LOW_BATTERY");
    assert!(saw_accept_handoff, "healthy drone B should have accepted A's handoff");

    // One further round lets A drain its own inbox and observe the
    // AcceptHandoff it's the subject of, clearing handoff_pending.
    step(&bus, &mut drones, &g, &oracle).await;
    assert!(drones[&a].snapshot().assigned_tiles < 1 || !drones[&a].is_dead());
}

// --- property-based invariants ----------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// Coverage percent stays within bounds and visited-tile/message counts
    /// never shrink tick over tick, across a range of small worlds and seeds.
    #[test]
    fn coverage_is_bounded_and_monotone(
        width in 5u32..12,
        height in 5u32..12,
        num_agents in 2u32..5,
        num_targets in 1u32..4,
        seed in 0u64..1000,
    ) {
        let cfg = SimConfig {
            grid_width: width,
            grid_height: height,
            num_agents,
            num_targets,
            duration_seconds: 30.0,
            seed,
            tick_interval: 0.1,
            detection_probability: 0.5,
        };
        let mut sim = Sim::init(cfg).unwrap();

        let mut last_visited = 0usize;
        let mut last_sent = 0u64;
        for _ in 0..60 {
            sim.tick(&mut NoopObserver).unwrap();
            let visited = sim.grid().visited_tiles().len();
            let coverage = sim.grid().coverage_percent();
            prop_assert!((0.0..=100.0).contains(&coverage));
            prop_assert!(visited >= last_visited, "visited tile count must never shrink");
            last_visited = visited;

            let sent = sim.metrics().current().unwrap().messages_sent;
            prop_assert!(sent >= last_sent, "total messages sent must never shrink");
            last_sent = sent;
        }
    }
}
