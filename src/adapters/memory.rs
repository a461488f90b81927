//! In-memory build history.
//!
//! Backs tests and embedded use. Executions are recorded against the project
//! they ran in; a fetch for a project also returns its sub-projects' records.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ProjectNode, ProjectTree, RawExecutionRecord};
use crate::domain::ports::{AnalysisWindow, BuildHistoryStore};

#[derive(Debug, Default)]
pub struct InMemoryBuildHistory {
    tree: RwLock<ProjectTree>,
    executions: RwLock<HashMap<String, Vec<RawExecutionRecord>>>,
    unavailable: AtomicBool,
    fetch_delay: RwLock<Duration>,
}

impl InMemoryBuildHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_project(&self, id: &str, parent_id: Option<&str>) {
        self.tree.write().await.insert(ProjectNode::new(id, parent_id));
    }

    pub async fn add_execution(&self, project_id: &str, record: RawExecutionRecord) {
        self.add_executions(project_id, vec![record]).await;
    }

    pub async fn add_executions(&self, project_id: &str, records: Vec<RawExecutionRecord>) {
        self.executions
            .write()
            .await
            .entry(project_id.to_string())
            .or_default()
            .extend(records);
    }

    /// Make every subsequent fetch fail with [`DomainError::HistoryUnavailable`].
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Release);
    }

    /// Delay every subsequent fetch, simulating a slow backend.
    pub async fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.write().await = delay;
    }
}

#[async_trait]
impl BuildHistoryStore for InMemoryBuildHistory {
    async fn fetch_executions(
        &self,
        project_id: &str,
        window: &AnalysisWindow,
    ) -> DomainResult<Vec<RawExecutionRecord>> {
        let delay = *self.fetch_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.unavailable.load(Ordering::Acquire) {
            return Err(DomainError::HistoryUnavailable(
                "in-memory history marked unavailable".to_string(),
            ));
        }

        let tree = self.tree.read().await;
        let executions = self.executions.read().await;

        let records = executions
            .iter()
            .filter(|(owner, _)| tree.ancestors(owner).any(|id| id == project_id))
            .flat_map(|(_, records)| records.iter())
            .filter(|r| window.contains(r.timestamp))
            .cloned()
            .collect();

        Ok(records)
    }

    async fn project_tree(&self) -> DomainResult<ProjectTree> {
        if self.unavailable.load(Ordering::Acquire) {
            return Err(DomainError::HistoryUnavailable(
                "in-memory history marked unavailable".to_string(),
            ));
        }
        Ok(self.tree.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TestStatus;

    fn record(build_id: i64, timestamp: i64) -> RawExecutionRecord {
        RawExecutionRecord::new(build_id, 1, TestStatus::Ok, "bt", Some(1), "agent", timestamp)
    }

    #[tokio::test]
    async fn test_fetch_includes_sub_projects() {
        let store = InMemoryBuildHistory::new();
        store.add_project("_Root", None).await;
        store.add_project("child", Some("_Root")).await;
        store.add_project("sibling", Some("_Root")).await;
        store.add_execution("_Root", record(1, 10)).await;
        store.add_execution("child", record(2, 10)).await;
        store.add_execution("sibling", record(3, 10)).await;

        let window = AnalysisWindow::unbounded();
        assert_eq!(store.fetch_executions("_Root", &window).await.unwrap().len(), 3);

        let child = store.fetch_executions("child", &window).await.unwrap();
        assert_eq!(child.len(), 1);
        assert_eq!(child[0].build_id, 2);
    }

    #[tokio::test]
    async fn test_fetch_respects_window() {
        let store = InMemoryBuildHistory::new();
        store.add_project("p", None).await;
        store.add_executions("p", vec![record(1, 5), record(2, 50), record(3, 500)]).await;

        let records = store
            .fetch_executions("p", &AnalysisWindow::new(10, 100))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].build_id, 2);
    }

    #[test]
    fn test_project_tree_snapshot() {
        let store = InMemoryBuildHistory::new();
        let tree = tokio_test::block_on(async {
            store.add_project("_Root", None).await;
            store.add_project("child", Some("_Root")).await;
            store.project_tree().await
        })
        .unwrap();

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.parent_of("child"), Some("_Root"));
    }

    #[tokio::test]
    async fn test_unavailable() {
        let store = InMemoryBuildHistory::new();
        store.set_unavailable(true).await;
        assert!(matches!(
            store.fetch_executions("p", &AnalysisWindow::unbounded()).await,
            Err(DomainError::HistoryUnavailable(_))
        ));
        assert!(store.project_tree().await.is_err());

        store.set_unavailable(false).await;
        assert!(store.fetch_executions("p", &AnalysisWindow::unbounded()).await.is_ok());
    }
}
