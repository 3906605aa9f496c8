//! Application configuration
//!
//! Layered with the `config` crate: serde defaults, then an optional TOML
//! file, then `FACT_ARCHIVE__<SECTION>__<KEY>` environment variables.

use crate::error::{FactError, Result};
use crate::facts::ArchiveConfig;
use crate::fetcher::FetcherConfig;
use crate::scheduler::SchedulerConfig;
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "fact-archive.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "FACT_ARCHIVE";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_format")]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> LogFormat {
    LogFormat::Pretty
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

impl Config {
    /// Load from `path` (or [`DEFAULT_CONFIG_FILE`] if it exists) plus the
    /// environment. An explicitly given file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document, without the environment layer
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the rest of the crate cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.archive.path.as_os_str().is_empty() {
            return Err(FactError::Configuration("archive.path must not be empty".into()));
        }
        if self.fetcher.base_url.trim().is_empty() {
            return Err(FactError::Configuration("fetcher.base_url must not be empty".into()));
        }
        if self.fetcher.timeout_ms == 0 {
            return Err(FactError::Configuration("fetcher.timeout_ms must be positive".into()));
        }
        if self.scheduler.interval_secs == 0 {
            return Err(FactError::Configuration(
                "scheduler.interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::CorruptPolicy;
    use std::path::PathBuf;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.archive.path, PathBuf::from("fact_archive.json"));
        assert_eq!(config.archive.on_corrupt, CorruptPolicy::Reset);
        assert!(config.archive.atomic_write);
        assert_eq!(config.scheduler.interval_secs, 60);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_str() {
        let config = Config::from_toml_str(
            r#"
            [archive]
            path = "data/facts.json"
            on_corrupt = "fail"

            [fetcher]
            base_url = "http://localhost:8080"
            language = "de"
            timeout_ms = 2500
            retry_attempts = 3

            [scheduler]
            interval_secs = 5
            max_cycles = 10

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.archive.path, PathBuf::from("data/facts.json"));
        assert_eq!(config.archive.on_corrupt, CorruptPolicy::Fail);
        assert!(config.archive.atomic_write);
        assert_eq!(config.fetcher.base_url, "http://localhost:8080");
        assert_eq!(config.fetcher.path, "/api/v2/facts/random");
        assert_eq!(config.fetcher.language.as_deref(), Some("de"));
        assert_eq!(config.fetcher.timeout_ms, 2500);
        assert_eq!(config.fetcher.retry_attempts, 3);
        assert_eq!(config.scheduler.max_cycles, Some(10));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.archive.path, PathBuf::from("fact_archive.json"));
        assert_eq!(config.fetcher.timeout_ms, 10_000);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = Config::from_toml_str("[scheduler]\ninterval_secs = 0").unwrap_err();
        assert!(matches!(err, FactError::Configuration(_)));
    }

    #[test]
    fn test_rejects_unknown_policy() {
        let err = Config::from_toml_str("[archive]\non_corrupt = \"shrug\"").unwrap_err();
        assert!(matches!(err, FactError::Configuration(_)));
    }

    #[test]
    fn test_load_file_with_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fact-archive.toml");
        std::fs::write(&path, "[archive]\npath = \"from-file.json\"\n").unwrap();

        std::env::set_var("FACT_ARCHIVE__SCHEDULER__INTERVAL_SECS", "15");
        let config = Config::load(Some(path.as_path())).unwrap();
        std::env::remove_var("FACT_ARCHIVE__SCHEDULER__INTERVAL_SECS");

        assert_eq!(config.archive.path, PathBuf::from("from-file.json"));
        assert_eq!(config.scheduler.interval_secs, 15);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(dir.path().join("absent.toml").as_path()));
        assert!(result.is_err());
    }
}
