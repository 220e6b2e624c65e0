use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::ObserveError;

/// Validated `EnvFilter` expression, e.g. `"info"` or `"klock_core=trace,info"`.
///
/// Validation happens on construction, so turning it into a filter later cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogLevel(String);

impl LogLevel {
    pub fn new(s: impl Into<String>) -> Result<Self, ObserveError> {
        Self::try_from(s.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the filter for subscriber installation.
    pub fn to_env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.0).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}

impl FromStr for LogLevel {
    type Err = ObserveError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for LogLevel {
    type Error = ObserveError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        EnvFilter::try_new(&s)
            .map(|_| Self(s.clone()))
            .map_err(|e| ObserveError::InvalidLevel(format!("{s}: {e}")))
    }
}

impl From<LogLevel> for String {
    fn from(l: LogLevel) -> Self {
        l.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_directive_levels() {
        for lvl in ["info", "warn", "trace", "klock_core=trace,info"] {
            assert!(lvl.parse::<LogLevel>().is_ok(), "rejected {lvl}");
        }
    }

    #[test]
    fn rejects_unknown_level_names() {
        for lvl in ["klock_core=loud", "a=trace,b=wat"] {
            assert!(LogLevel::new(lvl).is_err(), "accepted {lvl}");
        }
    }

    #[test]
    fn default_is_info() {
        assert_eq!(LogLevel::default().as_str(), "info");
        let _ = LogLevel::default().to_env_filter();
    }

    #[test]
    fn serde_validates_on_read() {
        let lvl: LogLevel = serde_json::from_str(r#""debug""#).unwrap();
        assert_eq!(lvl.as_str(), "debug");
        assert!(serde_json::from_str::<LogLevel>(r#""x=nope""#).is_err());
    }
}
