use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("protocol configuration error: {0}")]
    Config(String),

    #[error("malformed message payload: {0}")]
    MalformedPayload(String),
}

pub type ProtoResult<T> = Result<T, ProtoError>;
