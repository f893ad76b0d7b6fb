//! Statement execution.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bench_postgresql::{connect, quote_ident, ConnectionOpts};
use std::time::Duration;
use tokio_postgres::{Client, SimpleQueryMessage};
use tracing::debug;

/// Captured output of one executed statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementOutput {
    /// Rows returned, or affected for DML.
    pub rows: u64,
    /// Returned rows rendered one per line, columns separated by `|`.
    pub text: String,
}

/// Runs single statements for the workload executor.
#[async_trait]
pub trait StatementRunner: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<StatementOutput>;

    /// Return the plan text for `sql` produced with the given option string.
    async fn explain(&self, sql: &str, options: &str) -> Result<String>;
}

/// Runs statements on one PostgreSQL session over the simple-query protocol.
pub struct PostgresRunner {
    client: Client,
}

impl PostgresRunner {
    /// Connect and prepare the session: tables resolve in the benchmark
    /// schema and statements are cancelled by the server after `timeout`.
    pub async fn connect(opts: &ConnectionOpts, timeout: Option<Duration>) -> Result<Self> {
        let client = connect(opts).await?;
        let mut setup = format!("SET search_path TO {}, public", quote_ident(&opts.schema));
        if let Some(timeout) = timeout {
            setup.push_str(&format!(
                "; SET statement_timeout = {}",
                timeout.as_millis()
            ));
        }
        client
            .batch_execute(&setup)
            .await
            .context("Failed to prepare benchmark session")?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

/// Render simple-query messages as text and count rows.
fn render(messages: &[SimpleQueryMessage]) -> StatementOutput {
    let mut output = StatementOutput::default();
    let mut seen_rows = 0u64;
    let mut completed = None;

    for message in messages {
        match message {
            SimpleQueryMessage::Row(row) => {
                let line = (0..row.len())
                    .map(|i| row.get(i).unwrap_or(""))
                    .collect::<Vec<_>>()
                    .join("|");
                output.text.push_str(&line);
                output.text.push('\n');
                seen_rows += 1;
            }
            SimpleQueryMessage::CommandComplete(n) => {
                completed = Some(completed.unwrap_or(0) + n);
            }
            _ => {}
        }
    }
    output.rows = completed.unwrap_or(seen_rows);
    output
}

#[async_trait]
impl StatementRunner for PostgresRunner {
    async fn execute(&self, sql: &str) -> Result<StatementOutput> {
        debug!("Executing: {}", sql.lines().next().unwrap_or_default());
        let messages = self.client.simple_query(sql).await?;
        Ok(render(&messages))
    }

    async fn explain(&self, sql: &str, options: &str) -> Result<String> {
        let explain = if options.trim().is_empty() {
            format!("EXPLAIN {sql}")
        } else {
            format!("EXPLAIN ({options}) {sql}")
        };
        let messages = self.client.simple_query(&explain).await?;
        Ok(render(&messages).text)
    }
}
