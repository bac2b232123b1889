use std::collections::{BTreeMap, BTreeSet};

use sar_bus::Bus;
use sar_core::{DroneId, Grid, MessageId, Position, SimTime};
use sar_proto::{DetectionOracle, DetectionResult, Message, MessageKind, MessagePayload, OracleError, SimulatedOracle};

use crate::state::DroneState;
use crate::Drone;

fn grid(w: u32, h: u32, targets: &[(i32, i32)]) -> Grid {
    let target_positions: BTreeSet<Position> =
        targets.iter().map(|&(x, y)| Position::new(x, y)).collect();
    Grid::new(w, h, target_positions)
}

struct AlwaysUnavailable;
impl DetectionOracle for AlwaysUnavailable {
    fn detect(&self, _: Position, _: &BTreeSet<Position>) -> Result<DetectionResult, OracleError> {
        Err(OracleError::Unavailable("test double".into()))
    }
}

#[tokio::test]
async fn dead_drone_emits_nothing_and_never_moves() {
    let bus = Bus::spawn();
    let id = DroneId(0);
    bus.register(id);

    let mut drone = Drone::new(id, Position::new(2, 2), 42, 0.3);
    // Assign the drone's own starting tile so it scans immediately, then
    // idles and drains at BATTERY_DRAIN_IDLE until it dies.
    drone.assign(&[Position::new(2, 2)], None);
    let g = grid(10, 10, &[]);
    let oracle = SimulatedOracle;
    let peers = BTreeMap::new();

    for _ in 0..1200 {
        let _ = drone.tick(SimTime(0.0), &g, &oracle, &peers, &bus).unwrap();
        if drone.is_dead() {
            break;
        }
    }
    assert!(drone.is_dead());

    let position_before = drone.position();
    let emitted = drone.tick(SimTime(1000.0), &g, &oracle, &peers, &bus).unwrap();
    assert!(emitted.is_empty());
    assert_eq!(drone.position(), position_before);
}

#[tokio::test]
async fn low_battery_triggers_handoff_request_once() {
    let bus = Bus::spawn();
    let id = DroneId(0);
    let peer = DroneId(1);
    bus.register(id);
    bus.register(peer);

    let mut drone = Drone::new(id, Position::new(0, 0), 42, 0.3);
    drone.assign(&[Position::new(1, 0)], None);
    let g = grid(10, 10, &[]);
    let oracle = SimulatedOracle;
    let peers = BTreeMap::from([(id, Position::new(0, 0)), (peer, Position::new(9, 9))]);

    // Drive battery below LOW by scanning repeatedly; 0.3/scan + 0.5/move
    // drains fast enough within a bounded number of ticks on a tiny grid.
    let mut handoff_count = 0;
    for _ in 0..1000 {
        let emitted = drone.tick(SimTime(0.0), &g, &oracle, &peers, &bus).unwrap();
        handoff_count += emitted
            .iter()
            .filter(|m| m.kind() == MessageKind::HandoffRequest)
            .count();
        if drone.battery() < 20.0 {
            break;
        }
    }
    assert_eq!(handoff_count, 1, "handoff_pending must gate re-emission");
}

#[tokio::test]
async fn searching_drone_visits_its_single_target_and_reports_it() {
    let bus = Bus::spawn();
    let id = DroneId(0);
    bus.register(id);

    let mut drone = Drone::new(id, Position::new(0, 0), 42, 1.0);
    let target = Position::new(3, 0);
    drone.assign(&[target], None);

    let g = grid(10, 10, &[(3, 0)]);
    let oracle = SimulatedOracle;
    let peers = BTreeMap::from([(id, Position::new(0, 0))]);

    let mut found = false;
    for _ in 0..20 {
        let emitted = drone.tick(SimTime(0.0), &g, &oracle, &peers, &bus).unwrap();
        if emitted.iter().any(|m| m.kind() == MessageKind::TargetFound) {
            found = true;
            break;
        }
    }

    assert!(found, "expected a TARGET_FOUND within 20 ticks");
    assert_eq!(drone.snapshot().visited_tiles, 1);
}

#[tokio::test]
async fn oracle_failure_falls_back_to_bernoulli() {
    let bus = Bus::spawn();
    let id = DroneId(0);
    bus.register(id);

    let mut drone = Drone::new(id, Position::new(0, 0), 7, 1.0);
    let target = Position::new(0, 0);
    drone.assign(&[target], None);

    let g = grid(10, 10, &[(0, 0)]);
    let oracle = AlwaysUnavailable;
    let peers = BTreeMap::from([(id, Position::new(0, 0))]);

    let emitted = drone.tick(SimTime(0.0), &g, &oracle, &peers, &bus).unwrap();
    assert!(emitted.iter().any(|m| m.kind() == MessageKind::TargetFound));
}

#[tokio::test]
async fn offer_tile_is_accepted_only_above_handoff_threshold() {
    let bus = Bus::spawn();
    let receiver_id = DroneId(0);
    let sender_id = DroneId(1);
    bus.register(receiver_id);
    bus.register(sender_id);

    let mut receiver = Drone::new(receiver_id, Position::new(0, 0), 42, 0.3);
    let g = grid(10, 10, &[]);
    let oracle = SimulatedOracle;
    let peers = BTreeMap::new();

    let offer = Message {
        id: MessageId(1),
        sender_id,
        timestamp: SimTime::ZERO,
        payload: MessagePayload::OfferTile { tiles: vec![Position::new(5, 5)] },
    };
    receiver.deliver(offer);

    let emitted = receiver.tick(SimTime(0.0), &g, &oracle, &peers, &bus).unwrap();
    assert!(emitted.iter().any(|m| m.kind() == MessageKind::AcceptOffer));
    assert_eq!(receiver.snapshot().assigned_tiles, 1);
}

#[tokio::test]
async fn deliver_drops_messages_from_self() {
    let bus = Bus::spawn();
    let id = DroneId(0);
    bus.register(id);
    let mut drone = Drone::new(id, Position::new(0, 0), 42, 0.3);

    drone.deliver(Message {
        id: MessageId(9),
        sender_id: id,
        timestamp: SimTime::ZERO,
        payload: MessagePayload::Heartbeat { position: Position::new(0, 0), battery: 100.0 },
    });

    let g = grid(5, 5, &[]);
    let oracle = SimulatedOracle;
    let peers = BTreeMap::new();
    // If the self-sent heartbeat had been queued, draining it would be a
    // silent no-op either way (Heartbeat has no handler); the real
    // assertion is that assigned_tiles/state are untouched by it.
    let _ = drone.tick(SimTime(0.0), &g, &oracle, &peers, &bus).unwrap();
    assert_eq!(drone.state(), DroneState::Idle);
}

#[tokio::test]
async fn reassign_clears_prior_assignment() {
    let bus = Bus::spawn();
    let id = DroneId(0);
    bus.register(id);
    let mut drone = Drone::new(id, Position::new(0, 0), 42, 0.3);

    drone.assign(&[Position::new(1, 1), Position::new(2, 2)], None);
    assert_eq!(drone.snapshot().assigned_tiles, 2);

    drone.reassign(&[Position::new(3, 3)], None);
    assert_eq!(drone.snapshot().assigned_tiles, 1);
}
