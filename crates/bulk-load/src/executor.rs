//! Job execution against PostgreSQL.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bench_postgresql::{connect, qualified, quote_ident, quote_literal, ConnectionOpts};
use futures::SinkExt;
use tracing::debug;

use crate::job::{JobOperation, LoadJob};
use crate::stream::RecordReader;

/// Result of a successful job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobOutput {
    /// Rows copied for copy jobs, estimated rows for analyze jobs.
    pub rows: Option<u64>,
}

/// Executes typed load jobs.
///
/// Implementations must tolerate concurrent calls; the orchestrator runs up
/// to `W` jobs at once.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    /// Verify the executor can run jobs at all. Called before every phase.
    async fn check(&self) -> Result<()>;

    /// Run one job to completion.
    async fn execute(&self, job: &LoadJob) -> Result<JobOutput>;
}

/// Runs each job on its own PostgreSQL session.
pub struct PostgresJobExecutor {
    opts: ConnectionOpts,
}

impl PostgresJobExecutor {
    pub fn new(opts: ConnectionOpts) -> Self {
        Self { opts }
    }

    fn table(&self, unit: &str) -> String {
        qualified(&self.opts.schema, unit)
    }

    /// SQL statements for non-copy jobs.
    pub fn statements(&self, job: &LoadJob) -> Vec<String> {
        let table = self.table(&job.unit);
        match &job.operation {
            JobOperation::TruncateAndDropKey { constraint } => {
                let mut sql = vec![format!("TRUNCATE TABLE {table}")];
                if let Some(constraint) = constraint {
                    sql.push(format!(
                        "ALTER TABLE {table} DROP CONSTRAINT IF EXISTS {}",
                        quote_ident(constraint)
                    ));
                }
                sql
            }
            JobOperation::Copy { delimiter, .. } => vec![format!(
                "COPY {table} FROM STDIN WITH (FORMAT text, DELIMITER {}, NULL '')",
                quote_literal(&char::from(*delimiter).to_string())
            )],
            JobOperation::RebuildKey {
                constraint,
                columns,
                maintenance_workers,
            } => vec![
                format!("SET max_parallel_maintenance_workers = {maintenance_workers}"),
                format!(
                    "ALTER TABLE {table} ADD CONSTRAINT {} PRIMARY KEY ({})",
                    quote_ident(constraint),
                    columns
                        .iter()
                        .map(|c| quote_ident(c))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            ],
            JobOperation::Analyze => vec![format!("ANALYZE {table}")],
        }
    }

    async fn copy(&self, job: &LoadJob, sources: &[std::path::PathBuf], delimiter: u8) -> Result<u64> {
        let client = connect(&self.opts).await?;
        let statement = self
            .statements(job)
            .into_iter()
            .next()
            .context("copy job produced no statement")?;

        let sink = client.copy_in(&statement).await?;
        futures::pin_mut!(sink);

        let mut reader = RecordReader::new(sources.to_vec(), delimiter);
        while let Some(chunk) = reader.next_chunk().await? {
            sink.send(chunk).await?;
        }
        let rows = sink.finish().await?;
        Ok(rows)
    }
}

#[async_trait]
impl JobExecutor for PostgresJobExecutor {
    async fn check(&self) -> Result<()> {
        let client = connect(&self.opts)
            .await
            .with_context(|| format!("Cannot reach {}", self.opts.display_url()))?;
        client.simple_query("SELECT 1").await?;
        Ok(())
    }

    async fn execute(&self, job: &LoadJob) -> Result<JobOutput> {
        debug!("{} {}: {:?}", job.unit, job.phase, job.operation);
        match &job.operation {
            JobOperation::Copy { sources, delimiter } => {
                let rows = self.copy(job, sources, *delimiter).await?;
                Ok(JobOutput { rows: Some(rows) })
            }
            JobOperation::Analyze => {
                let client = connect(&self.opts).await?;
                for sql in self.statements(job) {
                    client.batch_execute(&sql).await?;
                }
                let row = client
                    .query_opt(
                        "SELECT c.reltuples::bigint FROM pg_class c \
                         JOIN pg_namespace n ON n.oid = c.relnamespace \
                         WHERE n.nspname = $1 AND c.relname = $2",
                        &[&self.opts.schema, &job.unit],
                    )
                    .await?;
                let estimate = row
                    .map(|r| r.get::<_, i64>(0))
                    .filter(|n| *n >= 0)
                    .map(|n| n as u64);
                Ok(JobOutput { rows: estimate })
            }
            _ => {
                let client = connect(&self.opts).await?;
                for sql in self.statements(job) {
                    client.batch_execute(&sql).await?;
                }
                Ok(JobOutput::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TableUnit;
    use std::path::PathBuf;

    fn executor() -> PostgresJobExecutor {
        PostgresJobExecutor::new(ConnectionOpts::default())
    }

    #[test]
    fn test_setup_statements() {
        let unit = TableUnit::new("item", &["i_item_sk"]);
        let sql = executor().statements(&LoadJob::setup(&unit));
        assert_eq!(
            sql,
            vec![
                "TRUNCATE TABLE \"tpcds\".\"item\"",
                "ALTER TABLE \"tpcds\".\"item\" DROP CONSTRAINT IF EXISTS \"item_pkey\"",
            ]
        );

        let unit = TableUnit::new("dbgen_version", &[]);
        assert_eq!(executor().statements(&LoadJob::setup(&unit)).len(), 1);
    }

    #[test]
    fn test_copy_statement() {
        let unit = TableUnit::new("item", &["i_item_sk"]);
        let job = LoadJob::copy(&unit, vec![PathBuf::from("item.dat")], b'|');
        assert_eq!(
            executor().statements(&job),
            vec!["COPY \"tpcds\".\"item\" FROM STDIN WITH (FORMAT text, DELIMITER '|', NULL '')"]
        );
    }

    #[test]
    fn test_rebuild_statements() {
        let unit = TableUnit::new("inventory", &["inv_date_sk", "inv_item_sk", "inv_warehouse_sk"]);
        let job = LoadJob::rebuild(&unit, 6).unwrap();
        let sql = executor().statements(&job);
        assert_eq!(sql[0], "SET max_parallel_maintenance_workers = 6");
        assert_eq!(
            sql[1],
            "ALTER TABLE \"tpcds\".\"inventory\" ADD CONSTRAINT \"inventory_pkey\" \
             PRIMARY KEY (\"inv_date_sk\", \"inv_item_sk\", \"inv_warehouse_sk\")"
        );
    }
}
