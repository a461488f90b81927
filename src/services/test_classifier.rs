//! Per-project classification pass.
//!
//! Groups a project's executions by test, orders each history by build id
//! and sorts every test into the flaky, suspicious and always-failing
//! partitions. Tests are independent, so the per-test work runs on the rayon
//! pool when enabled.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::BTreeMap;

use super::failure_rates::aggregate;
use super::modification_algorithm::ModificationBasedAlgorithm;
use super::statistics_algorithm::SuspiciousStatisticsAlgorithm;
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AnalysisConfig, RawExecutionRecord, Reason, TestAnalysisResult, TestData,
};

/// Verdict for a single test.
#[derive(Debug, Clone, PartialEq)]
pub struct TestVerdict {
    pub data: TestData,
    pub flaky: bool,
    pub suspicious: bool,
    pub always_failing: bool,
}

/// Classifies execution histories into analysis results.
#[derive(Debug, Clone, Default)]
pub struct TestClassifier {
    modification: ModificationBasedAlgorithm,
    statistics: SuspiciousStatisticsAlgorithm,
    parallel: bool,
}

impl TestClassifier {
    pub fn new(
        modification: ModificationBasedAlgorithm,
        statistics: SuspiciousStatisticsAlgorithm,
        parallel: bool,
    ) -> Self {
        Self {
            modification,
            statistics,
            parallel,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            ModificationBasedAlgorithm::from_config(config),
            SuspiciousStatisticsAlgorithm::from_config(config),
            config.parallel,
        )
    }

    /// Classify one test given its history ordered by build id.
    ///
    /// Returns `None` when the test lands in no partition.
    pub fn classify_test(
        &self,
        project_id: &str,
        test_id: i64,
        history: &[RawExecutionRecord],
    ) -> Option<TestVerdict> {
        if history.is_empty() {
            return None;
        }

        let failures = history.iter().filter(|r| r.is_failure()).count();
        let always_failing = failures == history.len();
        let mixed = failures > 0 && !always_failing;

        let mut reason: Option<Reason> = self.modification.check_test(history);
        let flaky = reason.is_some();

        let mut suspicious = false;
        if !flaky && mixed {
            reason = self.statistics.check_test(history);
            suspicious = reason.is_some();
        }

        if !(flaky || suspicious || always_failing) {
            return None;
        }

        let rates = aggregate(history);
        Some(TestVerdict {
            data: TestData::new(test_id, project_id, rates.by_build_type, rates.by_agent, reason),
            flaky,
            suspicious,
            always_failing,
        })
    }

    /// Classify every test of a project.
    ///
    /// Fails on the first malformed record; no partial result is produced.
    pub fn classify_project(
        &self,
        project_id: &str,
        records: Vec<RawExecutionRecord>,
        start_date: DateTime<Utc>,
    ) -> DomainResult<TestAnalysisResult> {
        for record in &records {
            record.validate()?;
        }

        let histories = group_by_test(records);

        let verdicts: Vec<TestVerdict> = if self.parallel {
            histories
                .par_iter()
                .filter_map(|(test_id, history)| self.classify_test(project_id, *test_id, history))
                .collect()
        } else {
            histories
                .iter()
                .filter_map(|(test_id, history)| self.classify_test(project_id, *test_id, history))
                .collect()
        };

        let mut result = TestAnalysisResult {
            project_id: project_id.to_string(),
            start_date: Some(start_date),
            flaky_tests: Vec::new(),
            suspicious_tests: Vec::new(),
            always_failing_tests: Vec::new(),
        };

        // Verdicts arrive ordered by test id, so partitions are deterministic.
        for verdict in verdicts {
            if verdict.flaky {
                result.flaky_tests.push(verdict.data.clone());
            }
            if verdict.suspicious {
                result.suspicious_tests.push(verdict.data.clone());
            }
            if verdict.always_failing {
                result.always_failing_tests.push(verdict.data);
            }
        }

        Ok(result)
    }
}

/// Histories keyed by test id, each sorted by build id then timestamp.
fn group_by_test(records: Vec<RawExecutionRecord>) -> Vec<(i64, Vec<RawExecutionRecord>)> {
    let mut grouped: BTreeMap<i64, Vec<RawExecutionRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.test_id).or_default().push(record);
    }

    grouped
        .into_iter()
        .map(|(test_id, mut history)| {
            history.sort_by_key(|r| (r.build_id, r.timestamp));
            (test_id, history)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use crate::domain::models::TestStatus;

    fn raw(build_id: i64, test_id: i64, status: TestStatus, modification: Option<i64>) -> RawExecutionRecord {
        RawExecutionRecord::new(build_id, test_id, status, "bt", modification, "agent", build_id)
    }

    #[test]
    fn test_empty_history_is_excluded() {
        let classifier = TestClassifier::default();
        assert!(classifier.classify_test("p", 1, &[]).is_none());
    }

    #[test]
    fn test_always_failing_with_changes() {
        let classifier = TestClassifier::default();
        let history = [
            raw(1, 1, TestStatus::Failure, Some(1)),
            raw(2, 1, TestStatus::Failure, Some(2)),
        ];
        let verdict = classifier.classify_test("p", 1, &history).unwrap();
        assert!(verdict.always_failing);
        assert!(!verdict.flaky);
        assert!(!verdict.suspicious);
        assert_eq!(verdict.data.reason, None);
    }

    #[test]
    fn test_single_failure_without_changes_is_flaky() {
        let classifier = TestClassifier::default();
        let verdict = classifier
            .classify_test("p", 1, &[raw(1, 1, TestStatus::Failure, None)])
            .unwrap();
        assert!(verdict.flaky);
        assert_eq!(verdict.data.reason, Some(Reason::BuildWithoutChanges { build_id: 1 }));
    }

    #[test]
    fn test_mixed_without_evidence_is_excluded() {
        let classifier = TestClassifier::default();
        let history = [
            raw(1, 1, TestStatus::Ok, Some(1)),
            raw(2, 1, TestStatus::Failure, Some(2)),
        ];
        assert!(classifier.classify_test("p", 1, &history).is_none());
    }

    #[test]
    fn test_flaky_reason_suppresses_statistics() {
        let classifier = TestClassifier::default();
        let mut history: Vec<_> = (1..=10)
            .map(|b| {
                let status = if b % 2 == 0 { TestStatus::Failure } else { TestStatus::Ok };
                raw(b, 1, status, Some(b))
            })
            .collect();
        history.push(raw(11, 1, TestStatus::Ok, Some(10)));

        let verdict = classifier.classify_test("p", 1, &history).unwrap();
        assert!(verdict.flaky);
        assert!(!verdict.suspicious);
        assert!(verdict.data.is_builds_on_same_modification_reason());
    }

    #[test]
    fn test_classify_project_orders_histories() {
        let classifier = TestClassifier::default();
        // Out of order on purpose: the pass must sort by build id.
        let records = vec![
            raw(2, 7, TestStatus::Ok, Some(5)),
            raw(1, 7, TestStatus::Failure, Some(5)),
            raw(3, 8, TestStatus::Failure, Some(6)),
        ];

        let result = classifier.classify_project("p", records, Utc::now()).unwrap();

        assert_eq!(result.flaky_tests.len(), 1);
        assert_eq!(result.flaky_tests[0].test_id, 7);
        assert_eq!(
            result.flaky_tests[0].reason,
            Some(Reason::BuildsOnSameModification {
                failed_in_build_id: 1,
                successful_in_build_id: 2
            })
        );
        assert_eq!(result.always_failing_tests.len(), 1);
        assert_eq!(result.always_failing_tests[0].test_id, 8);
        assert!(result.suspicious_tests.is_empty());
    }

    #[test]
    fn test_classify_project_rejects_malformed_records() {
        let classifier = TestClassifier::default();
        let records = vec![raw(-4, 1, TestStatus::Ok, Some(1))];
        assert!(matches!(
            classifier.classify_project("p", records, Utc::now()),
            Err(DomainError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let records: Vec<_> = (0..200)
            .map(|i| {
                let status = if i % 3 == 0 { TestStatus::Failure } else { TestStatus::Ok };
                raw(i, i % 17, status, if i % 5 == 0 { None } else { Some(i / 4) })
            })
            .collect();
        let now = Utc::now();

        let parallel = TestClassifier::new(Default::default(), Default::default(), true)
            .classify_project("p", records.clone(), now)
            .unwrap();
        let sequential = TestClassifier::new(Default::default(), Default::default(), false)
            .classify_project("p", records, now)
            .unwrap();

        assert_eq!(parallel, sequential);
    }
}
