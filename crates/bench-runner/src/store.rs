//! Persistence of workload results.
//!
//! Two tables are maintained: a summary holding exactly the latest run and an
//! append-only history of every run.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bench_postgresql::{qualified, quote_ident};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;
use tokio_postgres::Client;

use crate::record::WorkloadRecord;

/// A persisted workload result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredResult {
    pub run_id: i64,
    pub query_id: u32,
    pub status: String,
    pub duration_ms: f64,
    pub rows_returned: u64,
    pub run_ts: DateTime<Utc>,
}

impl StoredResult {
    fn new(run_id: i64, record: &WorkloadRecord) -> Self {
        Self {
            run_id,
            query_id: record.id,
            status: record.status.to_string(),
            duration_ms: record.duration_ms(),
            rows_returned: record.rows,
            run_ts: Utc::now(),
        }
    }
}

/// Storage for run results.
#[async_trait]
pub trait ResultsStore: Send + Sync {
    /// Start a run: clear the latest-run summary and return a new run id.
    async fn begin_run(&self) -> Result<i64>;

    /// Upsert into the summary and append to the history.
    async fn record(&self, run_id: i64, record: &WorkloadRecord) -> Result<()>;

    /// Rows of the most recent run, ordered by workload id.
    async fn latest(&self) -> Result<Vec<StoredResult>>;

    /// Every recorded row, oldest run first.
    async fn history(&self) -> Result<Vec<StoredResult>>;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResultsStore;

#[async_trait]
impl ResultsStore for NullResultsStore {
    async fn begin_run(&self) -> Result<i64> {
        Ok(0)
    }

    async fn record(&self, _run_id: i64, _record: &WorkloadRecord) -> Result<()> {
        Ok(())
    }

    async fn latest(&self) -> Result<Vec<StoredResult>> {
        Ok(Vec::new())
    }

    async fn history(&self) -> Result<Vec<StoredResult>> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Default)]
struct MemoryTables {
    next_run: i64,
    summary: Vec<StoredResult>,
    history: Vec<StoredResult>,
}

/// Keeps both tables in process memory.
#[derive(Debug, Default)]
pub struct MemoryResultsStore {
    tables: Mutex<MemoryTables>,
}

impl MemoryResultsStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<std::sync::MutexGuard<'_, MemoryTables>> {
        self.tables
            .lock()
            .map_err(|_| anyhow::anyhow!("results store lock poisoned"))
    }
}

#[async_trait]
impl ResultsStore for MemoryResultsStore {
    async fn begin_run(&self) -> Result<i64> {
        let mut tables = self.tables()?;
        tables.summary.clear();
        tables.next_run += 1;
        Ok(tables.next_run)
    }

    async fn record(&self, run_id: i64, record: &WorkloadRecord) -> Result<()> {
        let row = StoredResult::new(run_id, record);
        let mut tables = self.tables()?;
        tables.summary.retain(|r| r.query_id != row.query_id);
        tables.summary.push(row.clone());
        tables.history.push(row);
        Ok(())
    }

    async fn latest(&self) -> Result<Vec<StoredResult>> {
        let mut rows = self.tables()?.summary.clone();
        rows.sort_by_key(|r| r.query_id);
        Ok(rows)
    }

    async fn history(&self) -> Result<Vec<StoredResult>> {
        Ok(self.tables()?.history.clone())
    }
}

/// `<schema>.bench_summary` and `<schema>.bench_results` tables.
pub struct PostgresResultsStore {
    client: Client,
    summary: String,
    results: String,
}

impl PostgresResultsStore {
    /// Wrap a connected client, creating both tables if needed.
    pub async fn new(client: Client, schema: &str) -> Result<Self> {
        let summary = qualified(schema, "bench_summary");
        let results = qualified(schema, "bench_results");
        client
            .batch_execute(&format!(
                "CREATE SCHEMA IF NOT EXISTS {schema_ident};
                 CREATE TABLE IF NOT EXISTS {summary} (
                     query_id integer PRIMARY KEY,
                     status text NOT NULL,
                     duration_ms double precision NOT NULL,
                     rows_returned bigint NOT NULL,
                     run_ts timestamptz NOT NULL
                 );
                 CREATE TABLE IF NOT EXISTS {results} (
                     run_id bigint NOT NULL,
                     query_id integer NOT NULL,
                     status text NOT NULL,
                     duration_ms double precision NOT NULL,
                     rows_returned bigint NOT NULL,
                     run_ts timestamptz NOT NULL
                 )",
                schema_ident = quote_ident(schema),
            ))
            .await
            .context("Failed to prepare results tables")?;
        Ok(Self {
            client,
            summary,
            results,
        })
    }

    async fn select(&self, sql: &str) -> Result<Vec<StoredResult>> {
        let rows = self.client.query(sql, &[]).await?;
        Ok(rows
            .iter()
            .map(|row| StoredResult {
                run_id: row.get(0),
                query_id: row.get::<_, i32>(1) as u32,
                status: row.get(2),
                duration_ms: row.get(3),
                rows_returned: row.get::<_, i64>(4) as u64,
                run_ts: row.get(5),
            })
            .collect())
    }
}

#[async_trait]
impl ResultsStore for PostgresResultsStore {
    async fn begin_run(&self) -> Result<i64> {
        self.client
            .batch_execute(&format!("TRUNCATE {}", self.summary))
            .await
            .context("Failed to clear benchmark summary")?;
        let row = self
            .client
            .query_one(
                &format!("SELECT COALESCE(MAX(run_id), 0) + 1 FROM {}", self.results),
                &[],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn record(&self, run_id: i64, record: &WorkloadRecord) -> Result<()> {
        let row = StoredResult::new(run_id, record);
        let query_id = row.query_id as i32;
        let rows = row.rows_returned as i64;
        self.client
            .execute(
                &format!(
                    "INSERT INTO {} (query_id, status, duration_ms, rows_returned, run_ts)
                     VALUES ($1, $2, $3, $4, $5)
                     ON CONFLICT (query_id) DO UPDATE SET
                         status = EXCLUDED.status,
                         duration_ms = EXCLUDED.duration_ms,
                         rows_returned = EXCLUDED.rows_returned,
                         run_ts = EXCLUDED.run_ts",
                    self.summary
                ),
                &[&query_id, &row.status, &row.duration_ms, &rows, &row.run_ts],
            )
            .await
            .with_context(|| format!("Failed to record workload {}", record.id))?;
        self.client
            .execute(
                &format!(
                    "INSERT INTO {} (run_id, query_id, status, duration_ms, rows_returned, run_ts)
                     VALUES ($1, $2, $3, $4, $5, $6)",
                    self.results
                ),
                &[&run_id, &query_id, &row.status, &row.duration_ms, &rows, &row.run_ts],
            )
            .await
            .with_context(|| format!("Failed to append history for workload {}", record.id))?;
        Ok(())
    }

    async fn latest(&self) -> Result<Vec<StoredResult>> {
        self.select(&format!(
            "SELECT (SELECT COALESCE(MAX(run_id), 0) FROM {}), query_id, status,
                    duration_ms, rows_returned, run_ts
             FROM {} ORDER BY query_id",
            self.results, self.summary
        ))
        .await
    }

    async fn history(&self) -> Result<Vec<StoredResult>> {
        self.select(&format!(
            "SELECT run_id, query_id, status, duration_ms, rows_returned, run_ts
             FROM {} ORDER BY run_id, query_id",
            self.results
        ))
        .await
    }
}
