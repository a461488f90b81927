//! Raw test execution facts pulled from build history.
//!
//! One record is one observed outcome of one test in one build. Records are
//! never mutated after ingestion; every analysis pass reads a fresh set.

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

/// Outcome of a single test execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// Test passed
    Ok,
    /// Test failed
    Failure,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Failure => "failure",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ok" | "success" | "normal" => Some(Self::Ok),
            "failure" | "failed" => Some(Self::Failure),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure)
    }
}

/// One observed test execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawExecutionRecord {
    /// Build the test ran in
    pub build_id: i64,
    /// Test name id
    pub test_id: i64,
    /// Outcome
    pub status: TestStatus,
    /// Build configuration the build belongs to
    pub build_type_id: String,
    /// Modification the build ran on; `None` for a build without changes
    #[serde(default)]
    pub modification_id: Option<i64>,
    /// Agent the build ran on
    pub agent_name: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl RawExecutionRecord {
    /// Create a new record.
    pub fn new(
        build_id: i64,
        test_id: i64,
        status: TestStatus,
        build_type_id: impl Into<String>,
        modification_id: Option<i64>,
        agent_name: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            build_id,
            test_id,
            status,
            build_type_id: build_type_id.into(),
            modification_id,
            agent_name: agent_name.into(),
            timestamp,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }

    /// Whether the build carried no changes at all.
    pub fn is_without_changes(&self) -> bool {
        self.modification_id.is_none()
    }

    /// Reject records no real build history would produce.
    pub fn validate(&self) -> DomainResult<()> {
        if self.build_id < 0 {
            return Err(DomainError::MalformedRecord(format!(
                "negative build id {} for test {}",
                self.build_id, self.test_id
            )));
        }
        if self.test_id < 0 {
            return Err(DomainError::MalformedRecord(format!(
                "negative test id {} in build {}",
                self.test_id, self.build_id
            )));
        }
        if self.timestamp < 0 {
            return Err(DomainError::MalformedRecord(format!(
                "negative timestamp in build {}",
                self.build_id
            )));
        }
        Ok(())
    }
}
