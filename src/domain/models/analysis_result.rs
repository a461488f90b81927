//! Per-project analysis snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::test_data::TestData;

/// Immutable result of one analysis pass for one project.
///
/// `start_date == None` means the project has not been analyzed yet, which is
/// distinct from an analyzed project with empty partitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestAnalysisResult {
    pub project_id: String,
    pub start_date: Option<DateTime<Utc>>,
    pub flaky_tests: Vec<TestData>,
    pub suspicious_tests: Vec<TestData>,
    pub always_failing_tests: Vec<TestData>,
}

/// Membership of one test across the three partitions of a result.
///
/// A test may be flagged in zero, one or several partitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestLookup<'a> {
    pub is_flaky: bool,
    pub is_suspicious: bool,
    pub is_always_failing: bool,
    pub test_data: Option<&'a TestData>,
}

impl TestLookup<'_> {
    pub fn is_flagged(&self) -> bool {
        self.is_flaky || self.is_suspicious || self.is_always_failing
    }
}

impl TestAnalysisResult {
    /// Placeholder for a project that has no computed result yet.
    pub fn not_computed(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            start_date: None,
            flaky_tests: Vec::new(),
            suspicious_tests: Vec::new(),
            always_failing_tests: Vec::new(),
        }
    }

    pub fn is_computed(&self) -> bool {
        self.start_date.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.flaky_tests.is_empty()
            && self.suspicious_tests.is_empty()
            && self.always_failing_tests.is_empty()
    }

    /// Scan all three partitions for `test_id`.
    ///
    /// When the test is present in several partitions, the data from the last
    /// match in the order flaky, suspicious, always failing is returned.
    pub fn lookup(&self, test_id: i64) -> TestLookup<'_> {
        let mut lookup = TestLookup::default();

        if let Some(data) = find(&self.flaky_tests, test_id) {
            lookup.is_flaky = true;
            lookup.test_data = Some(data);
        }
        if let Some(data) = find(&self.suspicious_tests, test_id) {
            lookup.is_suspicious = true;
            lookup.test_data = Some(data);
        }
        if let Some(data) = find(&self.always_failing_tests, test_id) {
            lookup.is_always_failing = true;
            lookup.test_data = Some(data);
        }

        lookup
    }
}

fn find(partition: &[TestData], test_id: i64) -> Option<&TestData> {
    partition.iter().find(|data| data.test_id == test_id)
}
