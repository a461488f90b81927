//! Ancestor fallback for result reads.
//!
//! A sub-project that was never analyzed on its own is covered by the nearest
//! analyzed ancestor, whose scope includes it.

use std::sync::Arc;

use super::result_holder::TestAnalysisResultHolder;
use crate::domain::models::{ProjectTree, TestAnalysisResult};
use crate::domain::ports::BuildHistoryStore;

/// Walk from `project_id` towards the root and return the first computed
/// result together with the id of the project it belongs to.
///
/// Returns `None` when neither the project nor any ancestor has been computed.
pub async fn find_computed_result<S>(
    tree: &ProjectTree,
    holder: &TestAnalysisResultHolder<S>,
    project_id: &str,
) -> Option<(String, Arc<TestAnalysisResult>)>
where
    S: BuildHistoryStore + ?Sized + 'static,
{
    for candidate in tree.ancestors(project_id) {
        let result = holder.get_result(candidate).await;
        if result.is_computed() {
            return Some((candidate.to_string(), result));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBuildHistory;
    use crate::domain::models::{AnalysisConfig, ProjectNode, RawExecutionRecord, TestStatus};

    async fn setup() -> (ProjectTree, TestAnalysisResultHolder<InMemoryBuildHistory>) {
        let store = Arc::new(InMemoryBuildHistory::new());
        store.add_project("_Root", None).await;
        store.add_project("backend", Some("_Root")).await;
        store.add_project("backend-api", Some("backend")).await;
        store
            .add_executions(
                "backend-api",
                vec![RawExecutionRecord::new(
                    1,
                    1,
                    TestStatus::Failure,
                    "bt",
                    None,
                    "agent",
                    chrono::Utc::now().timestamp_millis(),
                )],
            )
            .await;

        let tree = ProjectTree::from_nodes([
            ProjectNode::new("_Root", None),
            ProjectNode::new("backend", Some("_Root")),
            ProjectNode::new("backend-api", Some("backend")),
        ]);
        let holder = TestAnalysisResultHolder::new(store, &AnalysisConfig::default());
        (tree, holder)
    }

    #[tokio::test]
    async fn test_nothing_computed_reaches_root() {
        let (tree, holder) = setup().await;
        assert!(find_computed_result(&tree, &holder, "backend-api").await.is_none());
    }

    #[tokio::test]
    async fn test_falls_back_to_nearest_ancestor() {
        let (tree, holder) = setup().await;
        holder.recompute("_Root").await;
        holder.recompute("backend").await;

        let (owner, result) = find_computed_result(&tree, &holder, "backend-api")
            .await
            .unwrap();
        assert_eq!(owner, "backend");
        assert_eq!(result.project_id, "backend");
        assert_eq!(result.flaky_tests.len(), 1);
    }

    #[tokio::test]
    async fn test_own_result_wins() {
        let (tree, holder) = setup().await;
        holder.recompute("backend").await;
        holder.recompute("backend-api").await;

        let (owner, _) = find_computed_result(&tree, &holder, "backend-api")
            .await
            .unwrap();
        assert_eq!(owner, "backend-api");
    }
}
