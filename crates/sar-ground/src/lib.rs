//! `sar-ground` — the Ground Agent: fleet observer and advisor (§4.2).
//!
//! # Crate layout
//!
//! | Module     | Contents                                              |
//! |------------|--------------------------------------------------------|
//! | [`ground`] | `Ground` — inbox handling, coordination, tick          |
//! | [`state`]  | `DroneStatus`, `GroundStats`                            |
//!
//! Ground never mutates a drone. Every effect it has on the fleet is a
//! `GROUND_COMMAND` message; drones decide for themselves whether to act on
//! it. This crate has no fallible operations of its own — every method that
//! can fail does so only because publishing to the bus can, so it surfaces
//! `sar_bus::BusResult` directly rather than wrapping it.

pub mod ground;
pub mod state;

#[cfg(test)]
mod tests;

pub use ground::{Ground, COORDINATION_INTERVAL, CRITICAL_BATTERY, HEARTBEAT_TIMEOUT, LOW_BATTERY};
pub use state::{DroneStatus, GroundStats};
