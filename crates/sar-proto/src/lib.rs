//! `sar-proto` — the agent-to-agent message protocol and the detection
//! oracle boundary.
//!
//! # Crate layout
//!
//! | Module     | Contents                                             |
//! |------------|---------------------------------------------------------|
//! | [`message`]| `MessageKind`, `MessagePayload`, `Message`, `GroundCommand` |
//! | [`oracle`] | `DetectionOracle` trait, `SimulatedOracle`, Bernoulli fallback |
//! | [`error`]  | `ProtoError`, `ProtoResult<T>`                           |

pub mod error;
pub mod message;
pub mod oracle;

#[cfg(test)]
mod tests;

pub use error::{ProtoError, ProtoResult};
pub use message::{Detection, GroundCommand, Message, MessageKind, MessagePayload};
pub use oracle::{bernoulli_fallback, DetectionOracle, DetectionResult, OracleError, SimulatedOracle};
