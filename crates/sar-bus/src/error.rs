use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("message bus fan-out task is no longer running")]
    Closed,
}

pub type BusResult<T> = Result<T, BusError>;
