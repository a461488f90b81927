//! End-to-end classification behavior over a whole project.

mod common;

use chrono::Utc;
use common::{exec, pattern};
use flaky_tests::adapters::InMemoryBuildHistory;
use flaky_tests::services::TestClassifier;
use flaky_tests::{
    AnalysisConfig, RawExecutionRecord, Reason, RecomputeStatus, TestAnalysisResult,
    TestAnalysisResultHolder, TestStatus,
};
use std::sync::Arc;

const PROJECT: &str = "backend";

fn classify(records: Vec<RawExecutionRecord>) -> TestAnalysisResult {
    TestClassifier::from_config(&AnalysisConfig::default())
        .classify_project(PROJECT, records, Utc::now())
        .unwrap()
}

fn ids(tests: &[flaky_tests::TestData]) -> Vec<i64> {
    tests.iter().map(|t| t.test_id).collect()
}

#[test]
fn test_same_modification_pair_is_flaky() {
    let result = classify(vec![
        exec(1, 42, TestStatus::Failure, Some(5)),
        exec(2, 42, TestStatus::Ok, Some(5)),
    ]);

    assert_eq!(ids(&result.flaky_tests), vec![42]);
    assert_eq!(
        result.flaky_tests[0].reason,
        Some(Reason::BuildsOnSameModification {
            failed_in_build_id: 1,
            successful_in_build_id: 2,
        })
    );
    assert_eq!(result.flaky_tests[0].builds_on_same_modification().unwrap(), (1, 2));
    assert!(result.suspicious_tests.is_empty());
    assert!(result.always_failing_tests.is_empty());
}

#[test]
fn test_single_failure_without_changes_is_flaky() {
    let result = classify(vec![exec(1, 42, TestStatus::Failure, None)]);

    assert_eq!(ids(&result.flaky_tests), vec![42]);
    let data = &result.flaky_tests[0];
    assert_eq!(data.reason, Some(Reason::BuildWithoutChanges { build_id: 1 }));
    assert_eq!(data.build_without_changes_id().unwrap(), 1);
    assert!(data.suspicious_statistics().is_err());
}

#[test]
fn test_same_modification_rule_runs_first() {
    let result = classify(vec![
        exec(1, 42, TestStatus::Failure, None),
        exec(2, 42, TestStatus::Failure, Some(9)),
        exec(3, 42, TestStatus::Ok, Some(9)),
        exec(4, 42, TestStatus::Failure, None),
    ]);

    assert!(result.flaky_tests[0].is_builds_on_same_modification_reason());
    assert!(!result.flaky_tests[0].is_without_changes_reason());
}

#[test]
fn test_always_failing_lands_in_one_partition() {
    let result = classify(pattern(42, 1, "FFFFFFFF"));

    assert_eq!(ids(&result.always_failing_tests), vec![42]);
    assert!(result.flaky_tests.is_empty());
    assert!(result.suspicious_tests.is_empty());

    let lookup = result.lookup(42);
    assert!(lookup.is_always_failing);
    assert!(!lookup.is_flaky && !lookup.is_suspicious);
}

#[test]
fn test_all_failing_with_failure_without_changes_is_also_flaky() {
    let result = classify(vec![
        exec(1, 42, TestStatus::Failure, Some(5)),
        exec(2, 42, TestStatus::Failure, None),
        exec(3, 42, TestStatus::Failure, Some(6)),
    ]);

    assert_eq!(ids(&result.flaky_tests), vec![42]);
    assert_eq!(ids(&result.always_failing_tests), vec![42]);
    assert!(result.suspicious_tests.is_empty());
    assert_eq!(
        result.flaky_tests[0].reason,
        Some(Reason::BuildWithoutChanges { build_id: 2 })
    );
    assert_eq!(result.flaky_tests[0], result.always_failing_tests[0]);

    let lookup = result.lookup(42);
    assert!(lookup.is_flaky && lookup.is_always_failing);
    assert!(!lookup.is_suspicious);
}

#[test]
fn test_alternating_outcomes_are_suspicious() {
    let result = classify(pattern(42, 1, "OFOFOFOFOF"));

    assert_eq!(ids(&result.suspicious_tests), vec![42]);
    assert!(result.flaky_tests.is_empty());
    assert_eq!(
        result.suspicious_tests[0].reason,
        Some(Reason::SuspiciousFailureStatistics {
            total_length: 10,
            number: 5,
        })
    );
}

#[test]
fn test_mixed_project_partitions() {
    let mut records = Vec::new();
    records.extend(pattern(1, 1, "OFOFOFOFOF"));
    records.extend(pattern(2, 1, "FFFF"));
    records.extend(pattern(3, 1, "OOOOOOOO"));
    records.extend(pattern(4, 1, "OOOOOFFFFF"));
    records.push(exec(20, 5, TestStatus::Failure, Some(7)));
    records.push(exec(21, 5, TestStatus::Ok, Some(7)));

    let result = classify(records);

    assert_eq!(ids(&result.flaky_tests), vec![5]);
    assert_eq!(ids(&result.suspicious_tests), vec![1]);
    assert_eq!(ids(&result.always_failing_tests), vec![2]);

    // Passing and freshly broken tests carry no evidence.
    assert!(!result.lookup(3).is_flagged());
    assert!(!result.lookup(4).is_flagged());
}

#[test]
fn test_failure_rates_are_bounded() {
    let mut records = pattern(1, 1, "OFOFFOOFOF");
    records.extend(pattern(2, 1, "FFF"));
    records.push(RawExecutionRecord::new(30, 1, TestStatus::Failure, "Build_Windows", Some(3000), "agent-2", 5));

    let result = classify(records);
    let all = result
        .flaky_tests
        .iter()
        .chain(&result.suspicious_tests)
        .chain(&result.always_failing_tests);

    for data in all {
        for rate in data.build_type_failure_rates.values().chain(data.agent_failure_rates.values()) {
            assert!(rate.failures() <= rate.total_runs());
        }
        let stats = data.stats();
        assert!(stats.failures <= stats.total_runs);
    }
}

#[tokio::test]
async fn test_recompute_is_idempotent() {
    let store = Arc::new(InMemoryBuildHistory::new());
    store.add_project(PROJECT, None).await;
    let mut records = pattern(1, 1, "OFOFOFOFOF");
    records.extend(pattern(2, 1, "FFFF"));
    records.push(exec(20, 5, TestStatus::Failure, None));
    store.add_executions(PROJECT, records).await;

    let holder = TestAnalysisResultHolder::new(store, &AnalysisConfig::default());

    assert!(matches!(holder.recompute(PROJECT).await, RecomputeStatus::Applied { .. }));
    let first = holder.get_result(PROJECT).await;
    assert!(matches!(holder.recompute(PROJECT).await, RecomputeStatus::Applied { .. }));
    let second = holder.get_result(PROJECT).await;

    assert_eq!(first.flaky_tests, second.flaky_tests);
    assert_eq!(first.suspicious_tests, second.suspicious_tests);
    assert_eq!(first.always_failing_tests, second.always_failing_tests);
}
