use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::{ProjectTree, RawExecutionRecord};

/// Time range of build history inspected by one analysis pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisWindow {
    /// Inclusive lower bound, epoch milliseconds
    pub since: i64,
    /// Inclusive upper bound, epoch milliseconds
    pub until: i64,
}

impl AnalysisWindow {
    pub fn new(since: i64, until: i64) -> Self {
        Self { since, until }
    }

    /// The last `days` days up to `now`.
    ///
    /// A span reaching past the representable calendar starts at the
    /// earliest timestamp instead.
    pub fn last_days(days: u32, now: DateTime<Utc>) -> Self {
        let since = Duration::try_days(i64::from(days))
            .and_then(|span| now.checked_sub_signed(span))
            .map_or(i64::MIN, |since| since.timestamp_millis());
        Self {
            since,
            until: now.timestamp_millis(),
        }
    }

    /// Everything ever recorded.
    pub fn unbounded() -> Self {
        Self {
            since: i64::MIN,
            until: i64::MAX,
        }
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        (self.since..=self.until).contains(&timestamp)
    }
}

/// Read access to recorded test executions
///
/// Implementations decide what belongs to a project's scope (typically the
/// project and all of its sub-projects).
#[async_trait]
pub trait BuildHistoryStore: Send + Sync {
    /// All executions within the project scope whose timestamp lies in `window`
    async fn fetch_executions(
        &self,
        project_id: &str,
        window: &AnalysisWindow,
    ) -> DomainResult<Vec<RawExecutionRecord>>;

    /// The project hierarchy known to the store
    async fn project_tree(&self) -> DomainResult<ProjectTree>;
}
