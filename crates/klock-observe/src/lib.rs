//! Logging setup shared by klock binaries.
mod config;
pub use config::ObserveConfig;

mod error;
pub use error::{ObserveError, ObserveResult};

mod format;
pub use format::LogFormat;

mod install;

mod level;
pub use level::LogLevel;

mod timer;
pub use timer::UtcRfc3339;

/// Installs the global tracing subscriber described by `cfg`.
///
/// Afterwards every `tracing` macro in the process (`info!`, `debug!`, ...) goes through it.
/// Can be called once per process; later calls fail with [`ObserveError::AlreadyInitialized`].
///
/// # Examples
/// ```rust
/// use klock_observe::{ObserveConfig, init_logger};
///
/// init_logger(&ObserveConfig::default()).expect("logger must initialize");
/// tracing::info!("logger initialized");
/// ```
pub fn init_logger(cfg: &ObserveConfig) -> ObserveResult<()> {
    match cfg.format {
        LogFormat::Text => install::text(cfg),
        LogFormat::Json => install::json(cfg),
    }
}
