//! Modification-based reason inference.
//!
//! Correlates a test's outcomes with the modifications its builds ran on:
//! 1. a modification that produced both a failing and a passing run
//!    ([`Reason::BuildsOnSameModification`]), otherwise
//! 2. a failure in a build without changes ([`Reason::BuildWithoutChanges`]).
//!
//! The first rule that matches wins; both prefer the most recent builds.

use std::collections::HashMap;

use crate::domain::models::{AnalysisConfig, RawExecutionRecord, Reason};

#[derive(Debug, Default, Clone, Copy)]
struct OutcomePair {
    latest_failure: Option<i64>,
    latest_success: Option<i64>,
}

impl OutcomePair {
    fn record(&mut self, record: &RawExecutionRecord) {
        let slot = if record.is_failure() {
            &mut self.latest_failure
        } else {
            &mut self.latest_success
        };
        *slot = Some(slot.map_or(record.build_id, |id| id.max(record.build_id)));
    }

    fn divergent(&self) -> Option<(i64, i64)> {
        self.latest_failure.zip(self.latest_success)
    }
}

/// Read-only classifier over one test's execution history.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModificationBasedAlgorithm {
    same_build_type_only: bool,
}

impl ModificationBasedAlgorithm {
    pub fn new(same_build_type_only: bool) -> Self {
        Self {
            same_build_type_only,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.same_build_type_only)
    }

    /// Strongest modification-based reason for `history`, if any.
    pub fn check_test(&self, history: &[RawExecutionRecord]) -> Option<Reason> {
        self.builds_on_same_modification(history)
            .or_else(|| build_without_changes(history))
    }

    fn builds_on_same_modification(&self, history: &[RawExecutionRecord]) -> Option<Reason> {
        let mut groups: HashMap<(Option<&str>, i64), OutcomePair> = HashMap::new();

        for record in history {
            let Some(modification_id) = record.modification_id else {
                continue;
            };
            let build_type = self
                .same_build_type_only
                .then_some(record.build_type_id.as_str());
            groups
                .entry((build_type, modification_id))
                .or_default()
                .record(record);
        }

        groups
            .values()
            .filter_map(OutcomePair::divergent)
            .max_by_key(|&(failed, successful)| (failed.max(successful), failed))
            .map(|(failed, successful)| Reason::BuildsOnSameModification {
                failed_in_build_id: failed,
                successful_in_build_id: successful,
            })
    }
}

fn build_without_changes(history: &[RawExecutionRecord]) -> Option<Reason> {
    history
        .iter()
        .filter(|r| r.is_failure() && r.is_without_changes())
        .map(|r| r.build_id)
        .max()
        .map(|build_id| Reason::BuildWithoutChanges { build_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TestStatus::{self, Failure, Ok as Success};

    fn raw(build_id: i64, status: TestStatus, bt: &str, modification: Option<i64>) -> RawExecutionRecord {
        RawExecutionRecord::new(build_id, 0, status, bt, modification, "agent", 0)
    }

    #[test]
    fn test_single_passing_run_has_no_reason() {
        let algorithm = ModificationBasedAlgorithm::default();
        assert_eq!(algorithm.check_test(&[raw(1, Success, "", Some(1))]), None);
    }

    #[test]
    fn test_single_failing_run_with_changes_has_no_reason() {
        let algorithm = ModificationBasedAlgorithm::default();
        assert_eq!(algorithm.check_test(&[raw(1, Failure, "bt", Some(1))]), None);
    }

    #[test]
    fn test_same_modification_divergent_outcomes() {
        let algorithm = ModificationBasedAlgorithm::default();
        let history = [raw(1, Failure, "bt", Some(5)), raw(2, Success, "bt", Some(5))];
        assert_eq!(
            algorithm.check_test(&history),
            Some(Reason::BuildsOnSameModification {
                failed_in_build_id: 1,
                successful_in_build_id: 2,
            })
        );
    }

    #[test]
    fn test_most_recent_divergent_group_wins() {
        let algorithm = ModificationBasedAlgorithm::default();
        let history = [
            raw(1, Failure, "bt", Some(5)),
            raw(2, Success, "bt", Some(5)),
            raw(3, Success, "bt", Some(6)),
            raw(4, Failure, "bt", Some(7)),
            raw(5, Success, "bt", Some(7)),
            raw(6, Failure, "bt", Some(7)),
        ];
        assert_eq!(
            algorithm.check_test(&history),
            Some(Reason::BuildsOnSameModification {
                failed_in_build_id: 6,
                successful_in_build_id: 5,
            })
        );
    }

    #[test]
    fn test_same_modification_takes_precedence_over_no_changes() {
        let algorithm = ModificationBasedAlgorithm::default();
        let history = [
            raw(1, Failure, "bt", Some(5)),
            raw(2, Success, "bt", Some(5)),
            raw(3, Failure, "bt", None),
        ];
        assert!(matches!(
            algorithm.check_test(&history),
            Some(Reason::BuildsOnSameModification { .. })
        ));
    }

    #[test]
    fn test_build_without_changes_picks_latest_failure() {
        let algorithm = ModificationBasedAlgorithm::default();
        let history = [
            raw(1, Failure, "bt", None),
            raw(2, Success, "bt", None),
            raw(3, Failure, "bt", None),
            raw(4, Success, "bt", Some(9)),
        ];
        assert_eq!(
            algorithm.check_test(&history),
            Some(Reason::BuildWithoutChanges { build_id: 3 })
        );
    }

    #[test]
    fn test_passing_build_without_changes_is_not_evidence() {
        let algorithm = ModificationBasedAlgorithm::default();
        let history = [raw(1, Success, "bt", None), raw(2, Failure, "bt", Some(3))];
        assert_eq!(algorithm.check_test(&history), None);
    }

    #[test]
    fn test_same_build_type_only_splits_groups() {
        let history = [raw(1, Failure, "bt-linux", Some(5)), raw(2, Success, "bt-windows", Some(5))];

        assert!(ModificationBasedAlgorithm::new(false).check_test(&history).is_some());
        assert_eq!(ModificationBasedAlgorithm::new(true).check_test(&history), None);
    }
}
