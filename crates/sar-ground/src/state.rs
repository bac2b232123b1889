//! Ground's view of the fleet (§3, §4.2).
//!
//! Ground keeps its own [`DroneStatus`], distinct from `sar_drone::DroneStatus`:
//! it mirrors the same observable fields but adds the two pieces of state only
//! Ground needs — `last_heartbeat_wallclock` (to detect a silent drone) and
//! `is_active` (the result of that detection).

use sar_core::{Position, SimTime};
use sar_drone::DroneState;

/// Ground's record of a single drone, updated from two independent sources:
/// [`crate::Ground::handle_message`] (message-driven, from `HEARTBEAT`) and
/// [`crate::Ground::observe_snapshot`] (driver-pushed, from the full
/// per-tick state). `assigned_tiles` is a count, not the tile set itself —
/// Ground only ever sees `sar_drone::DroneStatus`'s own mirror of it.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DroneStatus {
    pub position: Position,
    pub battery: f64,
    pub state: DroneState,
    pub assigned_tiles: usize,
    pub visited_tiles: usize,
    pub targets_found: usize,
    pub last_heartbeat: SimTime,
    pub last_heartbeat_wallclock: SimTime,
    pub is_active: bool,
}

impl DroneStatus {
    pub fn new(position: Position, now: SimTime) -> Self {
        Self {
            position,
            battery: 100.0,
            state: DroneState::Idle,
            assigned_tiles: 0,
            visited_tiles: 0,
            targets_found: 0,
            last_heartbeat: now,
            last_heartbeat_wallclock: now,
            is_active: true,
        }
    }
}

/// Running counters reported by [`crate::Ground::stats`].
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroundStats {
    pub total_commands_sent: u64,
    pub total_messages_received: u64,
    pub targets_found: u64,
    pub active_drones: u64,
    pub coverage_percent: f64,
    pub coordination_cycles: u64,
}
