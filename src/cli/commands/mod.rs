//! CLI subcommand implementations.

pub mod analyze;
pub mod ingest;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::adapters::sqlite::{initialize_from_config, SqliteBuildHistory};
use crate::domain::errors::DomainError;
use crate::domain::models::{Config, ProjectTree};
use crate::domain::ports::BuildHistoryStore;

/// Open the configured history database.
pub(crate) async fn open_store(config: &Config) -> Result<Arc<SqliteBuildHistory>> {
    let pool = initialize_from_config(&config.database)
        .await
        .with_context(|| format!("Failed to open history database at {}", config.database.path))?;
    Ok(Arc::new(SqliteBuildHistory::new(pool)))
}

/// Load the project tree and make sure `project_id` is part of it.
pub(crate) async fn load_tree<S: BuildHistoryStore + ?Sized>(
    store: &S,
    project_id: &str,
) -> Result<ProjectTree> {
    let tree = store
        .project_tree()
        .await
        .context("Failed to load project hierarchy")?;
    if !tree.contains(project_id) {
        return Err(DomainError::ProjectNotFound(project_id.to_string()).into());
    }
    Ok(tree)
}
