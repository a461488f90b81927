//! Causal explanations attached to a flaky or suspicious test.

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

/// Why a test was classified, with the evidence backing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reason {
    /// The test failed in a build that carried no changes.
    BuildWithoutChanges { build_id: i64 },
    /// The same modification produced both a failing and a passing run.
    BuildsOnSameModification {
        failed_in_build_id: i64,
        successful_in_build_id: i64,
    },
    /// Out of the last `total_length` runs, `number` failed in an irregular pattern.
    SuspiciousFailureStatistics { total_length: u32, number: u32 },
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BuildWithoutChanges { .. } => "build_without_changes",
            Self::BuildsOnSameModification { .. } => "builds_on_same_modification",
            Self::SuspiciousFailureStatistics { .. } => "suspicious_failure_statistics",
        }
    }

    /// Human readable description of the evidence.
    pub fn describe(&self) -> String {
        match self {
            Self::BuildWithoutChanges { build_id } => {
                format!("failed in build #{build_id} which had no changes")
            }
            Self::BuildsOnSameModification {
                failed_in_build_id,
                successful_in_build_id,
            } => format!(
                "failed in build #{failed_in_build_id} and passed in build #{successful_in_build_id} on the same modification"
            ),
            Self::SuspiciousFailureStatistics {
                total_length,
                number,
            } => format!("{number} of the last {total_length} runs failed irregularly"),
        }
    }

    /// Build id of a [`Reason::BuildWithoutChanges`] reason.
    pub fn build_without_changes_id(&self) -> DomainResult<i64> {
        match self {
            Self::BuildWithoutChanges { build_id } => Ok(*build_id),
            other => Err(mismatch("build_without_changes", Some(other))),
        }
    }

    /// `(failed, successful)` build ids of a [`Reason::BuildsOnSameModification`] reason.
    pub fn builds_on_same_modification(&self) -> DomainResult<(i64, i64)> {
        match self {
            Self::BuildsOnSameModification {
                failed_in_build_id,
                successful_in_build_id,
            } => Ok((*failed_in_build_id, *successful_in_build_id)),
            other => Err(mismatch("builds_on_same_modification", Some(other))),
        }
    }

    /// `(total_length, number)` of a [`Reason::SuspiciousFailureStatistics`] reason.
    pub fn suspicious_statistics(&self) -> DomainResult<(u32, u32)> {
        match self {
            Self::SuspiciousFailureStatistics {
                total_length,
                number,
            } => Ok((*total_length, *number)),
            other => Err(mismatch("suspicious_failure_statistics", Some(other))),
        }
    }
}

/// Error for asking a reason (or its absence) for the wrong evidence.
pub(crate) fn mismatch(expected: &'static str, actual: Option<&Reason>) -> DomainError {
    DomainError::InvalidReasonState {
        expected,
        actual: actual.map_or("none", Reason::as_str),
    }
}
