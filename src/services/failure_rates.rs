//! Per build type and per agent failure-rate aggregation.

use std::collections::HashMap;

use crate::domain::models::{FailureRate, RawExecutionRecord};

/// Failure rates of one test along both dimensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureRates {
    pub by_build_type: HashMap<String, FailureRate>,
    pub by_agent: HashMap<String, FailureRate>,
}

/// Group a test's executions by build type and by agent.
///
/// Only dimensions that actually ran appear in the output.
pub fn aggregate(records: &[RawExecutionRecord]) -> FailureRates {
    let mut rates = FailureRates::default();

    for record in records {
        let failed = record.is_failure();
        rates
            .by_build_type
            .entry(record.build_type_id.clone())
            .or_insert_with(|| FailureRate::new(0, 0))
            .record(failed);
        rates
            .by_agent
            .entry(record.agent_name.clone())
            .or_insert_with(|| FailureRate::new(0, 0))
            .record(failed);
    }

    rates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TestStatus;

    fn record(build_id: i64, status: TestStatus, bt: &str, agent: &str) -> RawExecutionRecord {
        RawExecutionRecord::new(build_id, 1, status, bt, Some(build_id), agent, 0)
    }

    #[test]
    fn test_aggregate_groups_both_dimensions() {
        let records = vec![
            record(1, TestStatus::Ok, "bt1", "agent-a"),
            record(2, TestStatus::Failure, "bt1", "agent-b"),
            record(3, TestStatus::Failure, "bt2", "agent-b"),
        ];

        let rates = aggregate(&records);

        assert_eq!(rates.by_build_type["bt1"], FailureRate::new(2, 1));
        assert_eq!(rates.by_build_type["bt2"], FailureRate::new(1, 1));
        assert_eq!(rates.by_agent["agent-a"], FailureRate::new(1, 0));
        assert_eq!(rates.by_agent["agent-b"], FailureRate::new(2, 2));
    }

    #[test]
    fn test_aggregate_empty() {
        let rates = aggregate(&[]);
        assert!(rates.by_build_type.is_empty());
        assert!(rates.by_agent.is_empty());
    }
}
