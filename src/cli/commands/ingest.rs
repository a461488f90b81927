//! Build-history ingestion.

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

use super::open_store;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, ProjectNode, RawExecutionRecord};

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// JSON document with `projects` and `executions` arrays
    pub file: PathBuf,
}

/// Shape of an ingestion file.
#[derive(Debug, Default, Deserialize)]
pub struct IngestDocument {
    #[serde(default)]
    pub projects: Vec<ProjectNode>,
    #[serde(default)]
    pub executions: Vec<IngestExecution>,
}

/// An execution together with the project it ran in.
#[derive(Debug, Deserialize)]
pub struct IngestExecution {
    pub project_id: String,
    #[serde(flatten)]
    pub record: RawExecutionRecord,
}

impl IngestDocument {
    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Invalid ingestion document")
    }

    /// Executions grouped by project, in project id order.
    pub fn executions_by_project(&self) -> BTreeMap<&str, Vec<RawExecutionRecord>> {
        let mut grouped: BTreeMap<&str, Vec<RawExecutionRecord>> = BTreeMap::new();
        for execution in &self.executions {
            grouped
                .entry(execution.project_id.as_str())
                .or_default()
                .push(execution.record.clone());
        }
        grouped
    }
}

#[derive(Debug, Serialize)]
pub struct IngestOutput {
    pub success: bool,
    pub projects: usize,
    pub executions_read: usize,
    pub executions_inserted: u64,
}

impl CommandOutput for IngestOutput {
    fn to_human(&self) -> String {
        format!(
            "Ingested {} project(s); {} of {} execution(s) were new.",
            self.projects, self.executions_inserted, self.executions_read
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: IngestArgs, config: &Config, json_mode: bool) -> Result<()> {
    let content = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let document = IngestDocument::parse(&content)?;

    let store = open_store(config).await?;

    for project in &document.projects {
        store
            .insert_project(project)
            .await
            .with_context(|| format!("Failed to store project {}", project.id))?;
    }

    let mut inserted = 0;
    for (project_id, records) in document.executions_by_project() {
        inserted += store
            .insert_executions(project_id, &records)
            .await
            .with_context(|| format!("Failed to store executions for project {project_id}"))?;
    }

    info!(
        file = %args.file.display(),
        projects = document.projects.len(),
        executions = document.executions.len(),
        inserted,
        "build history ingested"
    );

    let out = IngestOutput {
        success: true,
        projects: document.projects.len(),
        executions_read: document.executions.len(),
        executions_inserted: inserted,
    };
    output(&out, json_mode);

    Ok(())
}
