use std::{env, fs, path::Path};

use anyhow::Context;
use serde::Deserialize;

use klock_model::LockConfig;
use klock_observe::ObserveConfig;

/// Environment variable naming an optional JSON settings file.
pub const CONFIG_ENV: &str = "KLOCK_CONFIG";

/// Top-level settings document: `{ "lock": {...}, "observe": {...} }`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub lock: LockConfig,
    pub observe: ObserveConfig,
}

impl Settings {
    /// Read settings from the file named by [`CONFIG_ENV`], or use defaults when it is unset.
    pub fn load() -> anyhow::Result<Self> {
        match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing settings in {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let settings: Settings = serde_json::from_str(raw)?;
        settings.lock.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        let s = Settings::from_json("{}").unwrap();
        assert_eq!(s.lock, LockConfig::default());
        assert_eq!(s.observe.level.as_str(), "info");
    }

    #[test]
    fn nested_sections_are_read() {
        let s = Settings::from_json(
            r#"{"lock": {"default_wait_timeout_ms": 100}, "observe": {"format": "json"}}"#,
        )
        .unwrap();

        assert_eq!(s.lock.default_wait_timeout_ms, 100);
        assert_eq!(s.observe.format, klock_observe::LogFormat::Json);
    }

    #[test]
    fn invalid_lock_section_is_rejected() {
        assert!(Settings::from_json(r#"{"lock": {"max_pending": 0}}"#).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Settings::from_file(Path::new("/nonexistent/klock.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/klock.json"));
    }
}
