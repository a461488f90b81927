use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Longest history window accepted, in days.
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid window_days: {0}. Must be between 1 and 36500")]
    InvalidWindowDays(u32),

    #[error("Invalid suspicious_window: {0}. Must be at least 1")]
    InvalidSuspiciousWindow(u32),

    #[error("Invalid min_suspicious_runs: {0}. Must be between 1 and suspicious_window ({1})")]
    InvalidMinSuspiciousRuns(u32, u32),

    #[error("Invalid failure ratio band [{0}, {1}]. Bounds must lie in [0, 1] with min <= max")]
    InvalidFailureRatioBand(f64, f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .flaky/config.yaml (project config)
    /// 3. .flaky/local.yaml (local overrides, optional)
    /// 4. Environment variables (FLAKY_* prefix, `__` separates nested keys)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".flaky/config.yaml"))
            .merge(Yaml::file(".flaky/local.yaml"))
            .merge(Env::prefixed("FLAKY_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let analysis = &config.analysis;

        if analysis.window_days == 0 || analysis.window_days > MAX_WINDOW_DAYS {
            return Err(ConfigError::InvalidWindowDays(analysis.window_days));
        }

        if analysis.suspicious_window == 0 {
            return Err(ConfigError::InvalidSuspiciousWindow(analysis.suspicious_window));
        }

        if analysis.min_suspicious_runs == 0
            || analysis.min_suspicious_runs > analysis.suspicious_window
        {
            return Err(ConfigError::InvalidMinSuspiciousRuns(
                analysis.min_suspicious_runs,
                analysis.suspicious_window,
            ));
        }

        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !in_unit(analysis.min_failure_ratio)
            || !in_unit(analysis.max_failure_ratio)
            || analysis.min_failure_ratio > analysis.max_failure_ratio
        {
            return Err(ConfigError::InvalidFailureRatioBand(
                analysis.min_failure_ratio,
                analysis.max_failure_ratio,
            ));
        }

        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}
