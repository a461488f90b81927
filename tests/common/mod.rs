//! Common test utilities for integration tests
//!
//! Record builders and fixtures shared across the integration test files.

#![allow(dead_code)]

use flaky_tests::{RawExecutionRecord, TestStatus};
use std::path::PathBuf;
use tempfile::TempDir;

pub const BUILD_TYPE: &str = "Build_Linux";
pub const AGENT: &str = "agent-1";

/// Current time in epoch milliseconds, inside any default analysis window.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Execution of `test_id` in `build_id` on the default build type and agent.
pub fn exec(
    build_id: i64,
    test_id: i64,
    status: TestStatus,
    modification_id: Option<i64>,
) -> RawExecutionRecord {
    RawExecutionRecord::new(
        build_id,
        test_id,
        status,
        BUILD_TYPE,
        modification_id,
        AGENT,
        now_ms() - 1_000 + build_id,
    )
}

/// Executions from a pattern such as `"OFOF"`, one build per character,
/// each build on its own modification.
pub fn pattern(test_id: i64, first_build: i64, pattern: &str) -> Vec<RawExecutionRecord> {
    pattern
        .chars()
        .zip(first_build..)
        .map(|(c, build_id)| {
            let status = if c == 'F' {
                TestStatus::Failure
            } else {
                TestStatus::Ok
            };
            exec(build_id, test_id, status, Some(build_id * 100))
        })
        .collect()
}

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Path to a SQLite database file in a temporary directory.
pub fn temp_db_path() -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let db_path = dir.path().join("history.db");
    (dir, db_path)
}

/// Setup test logging
///
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
