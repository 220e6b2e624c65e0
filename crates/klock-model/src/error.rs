use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid timeout for {field}: must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("invalid max_pending: must be greater than zero")]
    ZeroMaxPending,
}

pub type ModelResult<T> = Result<T, ModelError>;
