//! Top-level error type shared across the workspace.
//!
//! Sub-crates define their own small error enums and convert them into
//! `SarError` via `From` impls where they need to hand a failure upward.

use thiserror::Error;

use crate::DroneId;

/// The top-level error type for `sar-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum SarError {
    #[error("drone {0} not found")]
    DroneNotFound(DroneId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Shorthand result type used throughout the workspace.
pub type SarResult<T> = Result<T, SarError>;
