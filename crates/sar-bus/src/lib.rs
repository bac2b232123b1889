//! `sar-bus` — the agent-to-agent publish/subscribe message bus (§4.4).
//!
//! # Crate layout
//!
//! | Module   | Contents                                         |
//! |----------|-----------------------------------------------------|
//! | [`bus`]  | `Bus` — registration, publish, fan-out, barrier      |
//! | [`stats`]| `MessageStats` — per-kind send/receive counters      |
//! | [`error`]| `BusError`, `BusResult<T>`                           |
//!
//! # Concurrency
//!
//! Fan-out runs on a dedicated `tokio` task reading from an internal mpsc
//! channel (see `bus::Bus::spawn`). Publishing never blocks the calling
//! tick; callers that need every queued message delivered before proceeding
//! (the simulation driver, once per tick) call [`Bus::barrier`].

pub mod bus;
pub mod error;
pub mod stats;


pub use bus::Bus;
pub use error::{BusError, BusResult};
pub use stats::MessageStats;
