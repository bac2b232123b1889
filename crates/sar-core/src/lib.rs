//! `sar-core` — foundational types for the SAR drone swarm coordination
//! engine.
//!
//! This crate is a dependency of every other `sar-*` crate. It intentionally
//! has no `sar-*` dependencies and minimal external ones (only `rand`,
//! `thiserror` and `serde_json`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module    | Contents                                  |
//! |-----------|---------------------------------------------|
//! | [`ids`]   | `DroneId`, `MessageId`                       |
//! | [`grid`]  | `Position`, `Grid`                           |
//! | [`time`]  | `SimTime`, `TickCount`, `SimConfig`           |
//! | [`rng`]   | `DroneRng` (per-drone), `SimRng` (global)     |
//! | [`error`] | `SarError`, `SarResult`                       |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                  |
//! |---------|----------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.      |
//!           | Required for replay persistence and config files.       |

pub mod error;
pub mod grid;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{SarError, SarResult};
pub use grid::{Grid, Position};
pub use ids::{DroneId, MessageId};
pub use rng::{DroneRng, SimRng};
pub use time::{SimConfig, SimTime, TickCount};
