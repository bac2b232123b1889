//! `sar-sim` — the simulation driver for the SAR drone swarm coordination
//! engine (§4.5).
//!
//! # Per-tick order
//!
//! ```text
//! for tick in 0..config.total_ticks():
//!   ① barrier    — wait for the bus to finish routing last tick's publishes
//!   ② drones     — drain each drone's inbox, then `Drone::tick` it
//!   ③ ground     — drain Ground's inbox, then `Ground::tick` it
//!   ④ coverage   — union each drone's visited tiles into the shared grid
//!   ⑤ reallocate — if `should_reallocate`, repartition unvisited tiles
//!   ⑥ metrics    — update the rolling MetricsTracker history
//!   ⑦ observe    — hand the assembled FullState to the observer
//!   ⑧ record     — if recording, append a ReplayFrame
//! ```
//!
//! # Crate layout
//!
//! | Module      | Contents                                            |
//! |-------------|--------------------------------------------------------|
//! | [`sim`]     | `Sim` — world state, `init`, the tick loop            |
//! | [`observer`]| `SimObserver`, `NoopObserver`, `FullState`             |
//! | [`metrics`] | `MetricsTracker`, `MetricsSnapshot`                    |
//! | [`replay`]  | `ReplayFrame`                                          |
//! | [`error`]   | `SimError`, `SimResult`                                |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use sar_core::SimConfig;
//! use sar_sim::{NoopObserver, Sim};
//!
//! let mut sim = Sim::init(SimConfig::default())?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod error;
pub mod metrics;
pub mod observer;
pub mod replay;
pub mod sim;

#[cfg(test)]
mod tests;

pub use error::{SimError, SimResult};
pub use metrics::{MetricsSnapshot, MetricsTracker};
pub use observer::{FullState, GridSummary, NoopObserver, SimObserver, SimState};
pub use replay::ReplayFrame;
pub use sim::{Sim, SimControl};
