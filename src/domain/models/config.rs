use serde::{Deserialize, Serialize};

/// Main configuration structure for the analyzer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Classification thresholds and window sizes
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Build history database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Analysis tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AnalysisConfig {
    /// Days of build history fetched per pass
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Number of most recent executions inspected for suspicious statistics
    #[serde(default = "default_suspicious_window")]
    pub suspicious_window: u32,

    /// Fewer executions than this in the suspicious window is not enough evidence
    #[serde(default = "default_min_suspicious_runs")]
    pub min_suspicious_runs: u32,

    /// Lowest failure ratio (inclusive) still considered suspicious
    #[serde(default = "default_min_failure_ratio")]
    pub min_failure_ratio: f64,

    /// Highest failure ratio (inclusive) still considered suspicious
    #[serde(default = "default_max_failure_ratio")]
    pub max_failure_ratio: f64,

    /// Only pair failing and passing runs of the same modification within one build type
    #[serde(default)]
    pub same_build_type_only: bool,

    /// Classify tests on the rayon thread pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

const fn default_window_days() -> u32 {
    14
}

const fn default_suspicious_window() -> u32 {
    30
}

const fn default_min_suspicious_runs() -> u32 {
    4
}

const fn default_min_failure_ratio() -> f64 {
    0.1
}

const fn default_max_failure_ratio() -> f64 {
    0.9
}

const fn default_parallel() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            suspicious_window: default_suspicious_window(),
            min_suspicious_runs: default_min_suspicious_runs(),
            min_failure_ratio: default_min_failure_ratio(),
            max_failure_ratio: default_max_failure_ratio(),
            same_build_type_only: false,
            parallel: default_parallel(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` build history file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".flaky/history.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
