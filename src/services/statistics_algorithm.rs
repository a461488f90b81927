//! Suspicious failure statistics.
//!
//! Looks at the most recent executions of a test and flags a mixed pass/fail
//! pattern that is neither "almost always passes", "almost always fails", nor
//! a single switch between passing and failing.

use crate::domain::models::{AnalysisConfig, RawExecutionRecord, Reason};

/// Statistical classifier over the tail of one test's history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuspiciousStatisticsAlgorithm {
    window: u32,
    min_runs: u32,
    min_failure_ratio: f64,
    max_failure_ratio: f64,
}

impl Default for SuspiciousStatisticsAlgorithm {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl SuspiciousStatisticsAlgorithm {
    pub fn new(window: u32, min_runs: u32, min_failure_ratio: f64, max_failure_ratio: f64) -> Self {
        Self {
            window,
            min_runs,
            min_failure_ratio,
            max_failure_ratio,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.suspicious_window,
            config.min_suspicious_runs,
            config.min_failure_ratio,
            config.max_failure_ratio,
        )
    }

    /// Check `history`, which must be ordered oldest first.
    pub fn check_test(&self, history: &[RawExecutionRecord]) -> Option<Reason> {
        let window = usize::try_from(self.window).unwrap_or(usize::MAX);
        let recent = &history[history.len().saturating_sub(window)..];
        let total_length = u32::try_from(recent.len()).ok()?;

        if total_length == 0 || total_length < self.min_runs {
            return None;
        }

        let failures = recent.iter().filter(|r| r.is_failure()).count();
        let number = u32::try_from(failures).ok()?;
        if number == 0 || number == total_length {
            return None;
        }

        let ratio = f64::from(number) / f64::from(total_length);
        if ratio < self.min_failure_ratio || ratio > self.max_failure_ratio {
            return None;
        }

        if is_single_switch(recent, failures) {
            return None;
        }

        Some(Reason::SuspiciousFailureStatistics {
            total_length,
            number,
        })
    }
}

/// All failures sit in one block at the start or at the end of the window.
fn is_single_switch(recent: &[RawExecutionRecord], failures: usize) -> bool {
    let oldest = recent.iter().take(failures).all(RawExecutionRecord::is_failure);
    let newest = recent.iter().rev().take(failures).all(RawExecutionRecord::is_failure);
    oldest || newest
}
