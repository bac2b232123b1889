use std::collections::BTreeSet;

use sar_core::{DroneId, DroneRng, MessageId, Position, SimTime};

use crate::message::{Message, MessageKind, MessagePayload};
use crate::oracle::{bernoulli_fallback, DetectionOracle, SimulatedOracle};

#[test]
fn message_kind_matches_payload_tag() {
    let msg = Message {
        id: MessageId(1),
        sender_id: DroneId(0),
        timestamp: SimTime::ZERO,
        payload: MessagePayload::Heartbeat {
            position: Position::new(0, 0),
            battery: 100.0,
        },
    };
    assert_eq!(msg.kind(), MessageKind::Heartbeat);
}

#[test]
fn simulated_oracle_detects_only_targets() {
    let oracle = SimulatedOracle;
    let mut targets = BTreeSet::new();
    targets.insert(Position::new(5, 5));

    let hit = oracle.detect(Position::new(5, 5), &targets).unwrap();
    assert!(hit.person_detected);
    assert_eq!(hit.confidence, 0.92);

    let miss = oracle.detect(Position::new(0, 0), &targets).unwrap();
    assert!(!miss.person_detected);
}

#[test]
fn bernoulli_fallback_never_fires_off_target() {
    let mut rng = DroneRng::new(1, DroneId(0));
    let targets = BTreeSet::new();
    let result = bernoulli_fallback(Position::new(1, 1), &targets, 1.0, &mut rng);
    assert!(!result.person_detected);
}

#[test]
fn bernoulli_fallback_always_fires_at_probability_one() {
    let mut rng = DroneRng::new(1, DroneId(0));
    let mut targets = BTreeSet::new();
    targets.insert(Position::new(1, 1));
    let result = bernoulli_fallback(Position::new(1, 1), &targets, 1.0, &mut rng);
    assert!(result.person_detected);
}
