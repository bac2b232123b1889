//! Errors raised while constructing or driving a [`crate::Sim`].

use sar_bus::BusError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("message bus error: {0}")]
    Bus(#[from] BusError),

    #[error("replay I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("replay serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
