//! SQLite implementation of the BuildHistoryStore.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ProjectNode, ProjectTree, RawExecutionRecord, TestStatus};
use crate::domain::ports::{AnalysisWindow, BuildHistoryStore};

#[derive(Clone)]
pub struct SqliteBuildHistory {
    pool: SqlitePool,
}

impl SqliteBuildHistory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a project, or move it under a new parent if it already exists.
    pub async fn insert_project(&self, project: &ProjectNode) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO projects (id, parent_id) VALUES (?, ?)
               ON CONFLICT(id) DO UPDATE SET parent_id = excluded.parent_id"#,
        )
        .bind(&project.id)
        .bind(&project.parent_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record one execution. Returns `false` if it was already recorded.
    pub async fn insert_execution(
        &self,
        project_id: &str,
        record: &RawExecutionRecord,
    ) -> DomainResult<bool> {
        record.validate()?;
        let result = insert_query(project_id, record).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a batch of executions in one transaction.
    ///
    /// Returns the number of new rows; duplicates are skipped.
    pub async fn insert_executions(
        &self,
        project_id: &str,
        records: &[RawExecutionRecord],
    ) -> DomainResult<u64> {
        for record in records {
            record.validate()?;
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for record in records {
            inserted += insert_query(project_id, record)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;

        Ok(inserted)
    }
}

fn insert_query<'q>(
    project_id: &'q str,
    record: &'q RawExecutionRecord,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    sqlx::query(
        r#"INSERT OR IGNORE INTO test_executions
           (project_id, build_id, test_id, status, build_type_id, modification_id, agent_name, timestamp)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(project_id)
    .bind(record.build_id)
    .bind(record.test_id)
    .bind(record.status.as_str())
    .bind(&record.build_type_id)
    .bind(record.modification_id)
    .bind(&record.agent_name)
    .bind(record.timestamp)
}

#[derive(Debug, sqlx::FromRow)]
struct ExecutionRow {
    build_id: i64,
    test_id: i64,
    status: String,
    build_type_id: String,
    modification_id: Option<i64>,
    agent_name: String,
    timestamp: i64,
}

impl TryFrom<ExecutionRow> for RawExecutionRecord {
    type Error = DomainError;

    fn try_from(row: ExecutionRow) -> Result<Self, Self::Error> {
        let status = TestStatus::from_str(&row.status).ok_or_else(|| {
            DomainError::MalformedRecord(format!(
                "unknown status '{}' for test {} in build {}",
                row.status, row.test_id, row.build_id
            ))
        })?;

        Ok(Self {
            build_id: row.build_id,
            test_id: row.test_id,
            status,
            build_type_id: row.build_type_id,
            modification_id: row.modification_id,
            agent_name: row.agent_name,
            timestamp: row.timestamp,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProjectRow {
    id: String,
    parent_id: Option<String>,
}

#[async_trait]
impl BuildHistoryStore for SqliteBuildHistory {
    async fn fetch_executions(
        &self,
        project_id: &str,
        window: &AnalysisWindow,
    ) -> DomainResult<Vec<RawExecutionRecord>> {
        // UNION (not UNION ALL) stops the walk on a parent cycle.
        let rows: Vec<ExecutionRow> = sqlx::query_as(
            r#"WITH RECURSIVE scope(id) AS (
                   SELECT ?
                   UNION
                   SELECT p.id FROM projects p JOIN scope s ON p.parent_id = s.id
               )
               SELECT build_id, test_id, status, build_type_id, modification_id, agent_name, timestamp
               FROM test_executions
               WHERE project_id IN (SELECT id FROM scope)
                 AND timestamp BETWEEN ? AND ?
               ORDER BY build_id, timestamp"#,
        )
        .bind(project_id)
        .bind(window.since)
        .bind(window.until)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::HistoryUnavailable(e.to_string()))?;

        rows.into_iter().map(RawExecutionRecord::try_from).collect()
    }

    async fn project_tree(&self) -> DomainResult<ProjectTree> {
        let rows: Vec<ProjectRow> = sqlx::query_as("SELECT id, parent_id FROM projects")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::HistoryUnavailable(e.to_string()))?;

        Ok(ProjectTree::from_nodes(rows.into_iter().map(|row| ProjectNode {
            id: row.id,
            parent_id: row.parent_id,
        })))
    }
}
