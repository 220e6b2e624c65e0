mod domain;
pub use domain::{
    DEFAULT_MAX_PENDING, DEFAULT_RUN_TIMEOUT_MS, DEFAULT_WAIT_TIMEOUT_MS, Key, TimeoutMs,
};

mod error;
pub use error::{ModelError, ModelResult};

mod config;
pub use config::LockConfig;

mod options;
pub use options::{Budget, LockOptions};
