//! Drone state machine and the externally observable status snapshot (§3).

use sar_core::{DroneId, Position, SimTime};

/// A drone's lifecycle state. Initial `Idle`; transitions are driven
/// entirely from within [`crate::drone::Drone::tick`].
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DroneState {
    #[default]
    Idle,
    Searching,
    Returning,
    Dead,
}

/// Observable snapshot of a drone, as reported to the Ground controller and
/// the driver's `on_state_update` hook. Holds counts rather than full
/// collections for the tile sets, matching §3's "mirror of Drone's
/// externally observable fields."
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DroneStatus {
    pub id: DroneId,
    pub position: Position,
    pub battery: f64,
    pub state: DroneState,
    pub assigned_tiles: usize,
    pub visited_tiles: usize,
    pub targets_found: usize,
    pub last_heartbeat: SimTime,
}
