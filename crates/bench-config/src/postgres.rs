//! PostgreSQL-backed configuration store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bench_postgresql::qualified;
use tokio_postgres::Client;

use crate::store::ConfigProvider;

/// Stores settings in a `<schema>.config(key text primary key, value text)` table.
pub struct PostgresConfigStore {
    client: Client,
    table: String,
}

impl PostgresConfigStore {
    /// Wrap a connected client, creating the table if it does not exist.
    pub async fn new(client: Client, schema: &str) -> Result<Self> {
        let table = qualified(schema, "config");
        client
            .batch_execute(&format!(
                "CREATE SCHEMA IF NOT EXISTS {schema_ident};
                 CREATE TABLE IF NOT EXISTS {table} (key text PRIMARY KEY, value text)",
                schema_ident = bench_postgresql::quote_ident(schema),
            ))
            .await
            .with_context(|| format!("Failed to prepare config table {table}"))?;
        Ok(Self { client, table })
    }
}

#[async_trait]
impl ConfigProvider for PostgresConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = self
            .client
            .query_opt(
                &format!("SELECT value FROM {} WHERE key = $1", self.table),
                &[&key],
            )
            .await
            .with_context(|| format!("Failed to read setting '{key}'"))?;
        Ok(row.and_then(|r| r.get::<_, Option<String>>(0)))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.client
            .execute(
                &format!(
                    "INSERT INTO {} (key, value) VALUES ($1, $2)
                     ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
                    self.table
                ),
                &[&key, &value],
            )
            .await
            .with_context(|| format!("Failed to write setting '{key}'"))?;
        Ok(())
    }
}
