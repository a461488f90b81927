//! flaky-tests - flaky test detection over CI build history
//!
//! Classifies the tests of a project into flaky, suspicious and
//! always-failing partitions from their recorded executions, and caches the
//! latest result per project.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Execution records, failure rates, reasons,
//!   analysis results and the build-history port
//! - **Service Layer** (`services`): Classification algorithms and the result holder
//! - **Adapters** (`adapters`): In-memory and SQLite build-history stores
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use flaky_tests::adapters::InMemoryBuildHistory;
//! use flaky_tests::domain::models::AnalysisConfig;
//! use flaky_tests::services::TestAnalysisResultHolder;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(InMemoryBuildHistory::new());
//!     let holder = TestAnalysisResultHolder::new(store, &AnalysisConfig::default());
//!     holder.recompute("_Root").await;
//!     let result = holder.get_result("_Root").await;
//!     println!("{} flaky tests", result.flaky_tests.len());
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    AnalysisConfig, Config, DatabaseConfig, FailureRate, LoggingConfig, ProjectNode, ProjectTree,
    RawExecutionRecord, Reason, RunStats, TestAnalysisResult, TestData, TestStatus,
};
pub use domain::ports::{AnalysisWindow, BuildHistoryStore};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    find_computed_result, AnalysisEvent, RecomputeStatus, TestAnalysisResultHolder,
    TriggerOutcome,
};
