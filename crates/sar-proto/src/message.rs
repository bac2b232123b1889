//! The agent-to-agent message envelope and its closed payload variants.
//!
//! Grounded on `dt-behavior`'s `Intent` enum: a tagged variant per kind of
//! action, rather than a loose untyped map, keeps payload shape compile-time
//! checked on both the sending and receiving side.

use sar_core::{DroneId, MessageId, Position, SimTime};

use crate::error::{ProtoError, ProtoResult};

/// The closed set of message kinds exchanged on the bus.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageKind {
    OfferTile,
    AcceptOffer,
    HandoffRequest,
    AcceptHandoff,
    Heartbeat,
    TargetFound,
    GroundCommand,
}

impl MessageKind {
    /// All kinds, for iterating per-type statistics in a fixed order.
    pub const ALL: [MessageKind; 7] = [
        MessageKind::OfferTile,
        MessageKind::AcceptOffer,
        MessageKind::HandoffRequest,
        MessageKind::AcceptHandoff,
        MessageKind::Heartbeat,
        MessageKind::TargetFound,
        MessageKind::GroundCommand,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::OfferTile => "OFFER_TILE",
            MessageKind::AcceptOffer => "ACCEPT_OFFER",
            MessageKind::HandoffRequest => "HANDOFF_REQUEST",
            MessageKind::AcceptHandoff => "ACCEPT_HANDOFF",
            MessageKind::Heartbeat => "HEARTBEAT",
            MessageKind::TargetFound => "TARGET_FOUND",
            MessageKind::GroundCommand => "GROUND_COMMAND",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detection reported alongside `TARGET_FOUND`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Detection {
    pub bbox: (u32, u32, u32, u32),
    pub confidence: f64,
}

/// A directed command issued by the Ground Agent. These are carried inside
/// `MessagePayload::GroundCommand` and addressed to a specific drone.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroundCommand {
    /// Critical battery: recall the drone (observational only — Ground never
    /// mutates the drone directly, it only advises).
    Recall { drone: DroneId },
    /// Low battery: suggest the fleet coordinate a handoff for this drone.
    CoordinateHandoff { drone: DroneId },
    /// Directed reassignment following a brokered handoff: `target` should
    /// take on `tiles`.
    AssignTiles { target: DroneId, tiles: Vec<Position> },
}

/// The typed payload carried by a [`Message`], one variant per
/// [`MessageKind`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessagePayload {
    OfferTile {
        tiles: Vec<Position>,
    },
    AcceptOffer {
        original_message_id: MessageId,
        tiles: Vec<Position>,
    },
    HandoffRequest {
        tiles: Vec<Position>,
        position: Position,
        battery: f64,
    },
    AcceptHandoff {
        from_agent: DroneId,
        tiles: Vec<Position>,
    },
    Heartbeat {
        position: Position,
        battery: f64,
    },
    TargetFound {
        position: Position,
        confidence: f64,
        detections: Vec<Detection>,
        detection_method: &'static str,
    },
    GroundCommand(GroundCommand),
}

impl MessagePayload {
    pub fn kind(&self) -> MessageKind {
        match self {
            MessagePayload::OfferTile { .. } => MessageKind::OfferTile,
            MessagePayload::AcceptOffer { .. } => MessageKind::AcceptOffer,
            MessagePayload::HandoffRequest { .. } => MessageKind::HandoffRequest,
            MessagePayload::AcceptHandoff { .. } => MessageKind::AcceptHandoff,
            MessagePayload::Heartbeat { .. } => MessageKind::Heartbeat,
            MessagePayload::TargetFound { .. } => MessageKind::TargetFound,
            MessagePayload::GroundCommand(_) => MessageKind::GroundCommand,
        }
    }

    /// Rejects values no legitimate sender in this process could ever
    /// produce — a battery outside `[0, 100]`, a confidence outside
    /// `[0, 1]`. In-process payloads are built by `sar-drone`/`sar-ground`
    /// and the type system already guarantees their shape; this exists for
    /// payloads arriving from outside the process, e.g. a hand-edited or
    /// corrupted replay file (`spec.md` §7: "malformed message payload →
    /// log at warn, take fallback, continue").
    pub fn validate(&self) -> ProtoResult<()> {
        match self {
            MessagePayload::HandoffRequest { battery, .. } | MessagePayload::Heartbeat { battery, .. } => {
                if !(0.0..=100.0).contains(battery) {
                    return Err(ProtoError::MalformedPayload(format!("battery {battery} out of range [0, 100]")));
                }
            }
            MessagePayload::TargetFound { confidence, .. } => {
                if !(0.0..=1.0).contains(confidence) {
                    return Err(ProtoError::MalformedPayload(format!(
                        "detection confidence {confidence} out of range [0, 1]"
                    )));
                }
            }
            MessagePayload::OfferTile { .. }
            | MessagePayload::AcceptOffer { .. }
            | MessagePayload::AcceptHandoff { .. }
            | MessagePayload::GroundCommand(_) => {}
        }
        Ok(())
    }
}

/// A self-describing record published on the bus. `id` is unique for the
/// lifetime of one run (assigned by the bus at publish time).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    pub id: MessageId,
    pub sender_id: DroneId,
    pub timestamp: SimTime,
    pub payload: MessagePayload,
}

impl Message {
    #[inline]
    pub fn kind(&self) -> MessageKind {
        self.payload.kind()
    }

    /// See [`MessagePayload::validate`].
    pub fn validate(&self) -> ProtoResult<()> {
        self.payload.validate()
    }
}
