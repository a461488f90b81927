//! Per-test verdict produced by an analysis pass.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::failure_rate::{rank_by_significance, FailureRate};
use super::reason::{mismatch, Reason};
use crate::domain::errors::DomainResult;

/// Total runs and failures summed over all build types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_runs: u64,
    pub failures: u64,
}

/// Analysis verdict for one test within one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestData {
    pub test_id: i64,
    pub project_id: String,
    pub build_type_failure_rates: HashMap<String, FailureRate>,
    pub agent_failure_rates: HashMap<String, FailureRate>,
    pub reason: Option<Reason>,
}

impl TestData {
    pub fn new(
        test_id: i64,
        project_id: impl Into<String>,
        build_type_failure_rates: HashMap<String, FailureRate>,
        agent_failure_rates: HashMap<String, FailureRate>,
        reason: Option<Reason>,
    ) -> Self {
        Self {
            test_id,
            project_id: project_id.into(),
            build_type_failure_rates,
            agent_failure_rates,
            reason,
        }
    }

    /// Sum of runs and failures across all build-type failure rates.
    pub fn stats(&self) -> RunStats {
        self.build_type_failure_rates
            .values()
            .fold(RunStats::default(), |acc, rate| RunStats {
                total_runs: acc.total_runs + u64::from(rate.total_runs()),
                failures: acc.failures + u64::from(rate.failures()),
            })
    }

    pub fn has_reason(&self) -> bool {
        self.reason.is_some()
    }

    /// Build types the test failed in at least once, most significant first.
    pub fn failed_build_types(&self) -> Vec<&str> {
        failed_dimensions(&self.build_type_failure_rates)
    }

    /// Agents the test failed on at least once, most significant first.
    pub fn failed_agents(&self) -> Vec<&str> {
        failed_dimensions(&self.agent_failure_rates)
    }

    /// All build types, most significant first.
    pub fn ranked_build_types(&self) -> Vec<(&str, FailureRate)> {
        rank_by_significance(&self.build_type_failure_rates)
    }

    /// All agents, most significant first.
    pub fn ranked_agents(&self) -> Vec<(&str, FailureRate)> {
        rank_by_significance(&self.agent_failure_rates)
    }

    /// Ran in several build types but failed in exactly one of them.
    pub fn is_failed_only_in_single_build_type(&self) -> bool {
        self.build_type_failure_rates.len() > 1 && self.failed_build_types().len() == 1
    }

    /// Ran on several agents but failed on exactly one of them.
    pub fn is_failed_only_on_single_agent(&self) -> bool {
        self.agent_failure_rates.len() > 1 && self.failed_agents().len() == 1
    }

    pub fn is_without_changes_reason(&self) -> bool {
        matches!(self.reason, Some(Reason::BuildWithoutChanges { .. }))
    }

    pub fn is_builds_on_same_modification_reason(&self) -> bool {
        matches!(self.reason, Some(Reason::BuildsOnSameModification { .. }))
    }

    pub fn is_suspicious_statistics_reason(&self) -> bool {
        matches!(self.reason, Some(Reason::SuspiciousFailureStatistics { .. }))
    }

    pub fn build_without_changes_id(&self) -> DomainResult<i64> {
        self.reason
            .as_ref()
            .ok_or_else(|| mismatch("build_without_changes", None))?
            .build_without_changes_id()
    }

    pub fn builds_on_same_modification(&self) -> DomainResult<(i64, i64)> {
        self.reason
            .as_ref()
            .ok_or_else(|| mismatch("builds_on_same_modification", None))?
            .builds_on_same_modification()
    }

    pub fn suspicious_statistics(&self) -> DomainResult<(u32, u32)> {
        self.reason
            .as_ref()
            .ok_or_else(|| mismatch("suspicious_failure_statistics", None))?
            .suspicious_statistics()
    }
}

fn failed_dimensions(rates: &HashMap<String, FailureRate>) -> Vec<&str> {
    rank_by_significance(rates)
        .into_iter()
        .filter(|(_, rate)| rate.has_failures())
        .map(|(id, _)| id)
        .collect()
}
