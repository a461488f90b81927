//! Failure rate of one test along one dimension (build type or agent).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Aggregate of runs and failures for a (test, dimension) pair.
///
/// Ordering follows significance: a higher failure ratio is greater, and
/// between equal ratios the rate backed by more runs is greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawFailureRate")]
pub struct FailureRate {
    total_runs: u32,
    failures: u32,
}

/// Wire form of [`FailureRate`]; converted through [`FailureRate::new`].
#[derive(Deserialize)]
struct RawFailureRate {
    total_runs: u32,
    failures: u32,
}

impl From<RawFailureRate> for FailureRate {
    fn from(raw: RawFailureRate) -> Self {
        Self::new(raw.total_runs, raw.failures)
    }
}

impl FailureRate {
    /// Create a failure rate, clamping `failures` to `total_runs`.
    pub fn new(total_runs: u32, failures: u32) -> Self {
        Self {
            total_runs,
            failures: failures.min(total_runs),
        }
    }

    pub fn total_runs(&self) -> u32 {
        self.total_runs
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn has_failures(&self) -> bool {
        self.failures > 0
    }

    pub fn successes(&self) -> u32 {
        self.total_runs.saturating_sub(self.failures)
    }

    /// Failure ratio in `[0, 1]`; zero when nothing ran.
    pub fn ratio(&self) -> f64 {
        if self.total_runs == 0 {
            return 0.0;
        }
        f64::from(self.failures) / f64::from(self.total_runs)
    }

    /// Count one more execution.
    pub(crate) fn record(&mut self, failed: bool) {
        self.total_runs = self.total_runs.saturating_add(1);
        if failed {
            self.failures = self.failures.saturating_add(1).min(self.total_runs);
        }
    }
}

impl Ord for FailureRate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Cross-multiplied so equal ratios compare equal without float noise.
        let lhs = u64::from(self.failures) * u64::from(other.total_runs);
        let rhs = u64::from(other.failures) * u64::from(self.total_runs);
        lhs.cmp(&rhs)
            .then_with(|| self.total_runs.cmp(&other.total_runs))
    }
}

impl PartialOrd for FailureRate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dimension ids sorted most significant first, ties broken by id.
pub fn rank_by_significance(rates: &HashMap<String, FailureRate>) -> Vec<(&str, FailureRate)> {
    let mut ranked: Vec<(&str, FailureRate)> = rates
        .iter()
        .map(|(id, rate)| (id.as_str(), *rate))
        .collect();
    ranked.sort_by(|(id_a, a), (id_b, b)| b.cmp(a).then_with(|| id_a.cmp(id_b)));
    ranked
}
