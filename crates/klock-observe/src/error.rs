use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObserveError {
    #[error("invalid log format: {0} (expected: text|json)")]
    InvalidFormat(String),

    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    #[error("logger already initialized")]
    AlreadyInitialized,
}

pub type ObserveResult<T> = Result<T, ObserveError>;
