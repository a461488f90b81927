//! Project analysis command.

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use super::{load_tree, open_store};
use crate::cli::output::{list_table, output, truncate, CommandOutput};
use crate::domain::models::{Config, TestAnalysisResult, TestData};
use crate::services::{RecomputeStatus, TestAnalysisResultHolder};

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Project to analyze (its sub-projects are included)
    #[arg(short, long)]
    pub project: String,
}

#[derive(Debug, Serialize)]
pub struct TestRow {
    pub test_id: i64,
    pub total_runs: u64,
    pub failures: u64,
    pub failed_build_types: Vec<String>,
    pub reason: Option<String>,
}

impl From<&TestData> for TestRow {
    fn from(data: &TestData) -> Self {
        let stats = data.stats();
        Self {
            test_id: data.test_id,
            total_runs: stats.total_runs,
            failures: stats.failures,
            failed_build_types: data
                .failed_build_types()
                .into_iter()
                .map(str::to_string)
                .collect(),
            reason: data.reason.map(|r| r.describe()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeOutput {
    pub project_id: String,
    pub computed_at: Option<String>,
    pub flaky: Vec<TestRow>,
    pub suspicious: Vec<TestRow>,
    pub always_failing: Vec<TestRow>,
}

impl From<&TestAnalysisResult> for AnalyzeOutput {
    fn from(result: &TestAnalysisResult) -> Self {
        let rows = |tests: &[TestData]| tests.iter().map(TestRow::from).collect();
        Self {
            project_id: result.project_id.clone(),
            computed_at: result.start_date.map(|d| d.to_rfc3339()),
            flaky: rows(&result.flaky_tests),
            suspicious: rows(&result.suspicious_tests),
            always_failing: rows(&result.always_failing_tests),
        }
    }
}

fn render_section(title: &str, rows: &[TestRow]) -> String {
    if rows.is_empty() {
        return format!("{title}: none");
    }

    let mut table = list_table(&["test", "runs", "failures", "build types", "reason"]);
    for row in rows {
        table.add_row(vec![
            row.test_id.to_string(),
            row.total_runs.to_string(),
            row.failures.to_string(),
            truncate(&row.failed_build_types.join(", "), 40),
            row.reason.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    format!("{title} ({}):\n{table}", rows.len())
}

impl CommandOutput for AnalyzeOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Project: {}", self.project_id)];
        if let Some(ref computed_at) = self.computed_at {
            lines.push(format!("Computed: {computed_at}"));
        }
        lines.push(String::new());
        lines.push(render_section("Flaky tests", &self.flaky));
        lines.push(render_section("Suspicious tests", &self.suspicious));
        lines.push(render_section("Always failing tests", &self.always_failing));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: AnalyzeArgs, config: &Config, json_mode: bool) -> Result<()> {
    let store = open_store(config).await?;
    load_tree(store.as_ref(), &args.project).await?;

    let holder = TestAnalysisResultHolder::new(store, &config.analysis);
    if let RecomputeStatus::Failed { error, .. } = holder.recompute(&args.project).await {
        bail!("Analysis of project {} failed: {error}", args.project);
    }

    let result = holder.get_result(&args.project).await;
    output(&AnalyzeOutput::from(result.as_ref()), json_mode);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{FailureRate, Reason};
    use std::collections::HashMap;

    fn flaky_result() -> TestAnalysisResult {
        let mut result = TestAnalysisResult::not_computed("backend");
        result.start_date = Some(chrono::Utc::now());
        result.flaky_tests.push(TestData::new(
            7,
            "backend",
            HashMap::from([("bt".to_string(), FailureRate::new(2, 1))]),
            HashMap::from([("agent".to_string(), FailureRate::new(2, 1))]),
            Some(Reason::BuildWithoutChanges { build_id: 3 }),
        ));
        result
    }

    #[test]
    fn test_output_counts_partitions() {
        let out = AnalyzeOutput::from(&flaky_result());
        assert_eq!(out.flaky.len(), 1);
        assert!(out.suspicious.is_empty());
        assert_eq!(out.flaky[0].failed_build_types, vec!["bt".to_string()]);
        assert_eq!(out.flaky[0].total_runs, 2);
    }

    #[test]
    fn test_human_output_lists_sections() {
        let human = AnalyzeOutput::from(&flaky_result()).to_human();
        assert!(human.contains("Flaky tests (1)"));
        assert!(human.contains("Suspicious tests: none"));
        assert!(human.contains("build #3"));
    }

    #[test]
    fn test_json_output_shape() {
        let json = AnalyzeOutput::from(&flaky_result()).to_json();
        assert_eq!(json["project_id"], "backend");
        assert_eq!(json["flaky"][0]["test_id"], 7);
        assert!(json["always_failing"].as_array().unwrap().is_empty());
    }
}
