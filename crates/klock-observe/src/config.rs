use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::{format::LogFormat, level::LogLevel};

/// Logger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserveConfig {
    /// Output format.
    pub format: LogFormat,
    /// Filter expression.
    pub level: LogLevel,
    /// Include module targets in each line.
    pub with_targets: bool,
    /// Colorize text output when stdout is a terminal.
    pub use_color: bool,
}

impl Default for ObserveConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::default(),
            with_targets: true,
            use_color: true,
        }
    }
}

impl ObserveConfig {
    /// Color only when enabled and stdout is not redirected.
    pub fn should_use_color(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }
}
