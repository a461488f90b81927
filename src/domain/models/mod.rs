//! Domain models for test outcome analysis.

pub mod analysis_result;
pub mod config;
pub mod execution;
pub mod failure_rate;
pub mod project;
pub mod reason;
pub mod test_data;

pub use analysis_result::{TestAnalysisResult, TestLookup};
pub use config::{AnalysisConfig, Config, DatabaseConfig, LoggingConfig};
pub use execution::{RawExecutionRecord, TestStatus};
pub use failure_rate::{rank_by_significance, FailureRate};
pub use project::{ProjectNode, ProjectTree};
pub use reason::Reason;
pub use test_data::{RunStats, TestData};
