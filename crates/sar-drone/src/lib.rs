//! `sar-drone` — the autonomous drone agent (§4.1).
//!
//! # Crate layout
//!
//! | Module    | Contents                                             |
//! |-----------|-------------------------------------------------------|
//! | [`drone`] | `Drone` — state machine, inbox handling, tick         |
//! | [`astar`] | `find_path` — A* over the tile grid                   |
//! | [`state`] | `DroneState`, `DroneStatus`                           |
//!
//! A `Drone` owns its RNG, inbox, and cached path; nothing outside it
//! mutates that state directly. Publishing goes through a `&sar_bus::Bus`
//! passed into `tick`, so every message a drone sends gets a bus-assigned,
//! run-unique id before the drone has to reference it (needed to key
//! `pending_offers` by the outgoing `OFFER_TILE`'s id).

pub mod astar;
pub mod drone;
pub mod state;

#[cfg(test)]
mod tests;

pub use drone::Drone;
pub use state::{DroneState, DroneStatus};
