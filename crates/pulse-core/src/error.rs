use thiserror::Error;

#[derive(Debug, Error)]
pub enum PulseError {
    #[error("metric already registered: {0}")]
    AlreadyRegistered(String),
    #[error("metric registered with a different kind: {0}")]
    KindMismatch(String),
    #[error("sampling interval must be greater than zero")]
    InvalidInterval,
    #[error("internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, PulseError>;
