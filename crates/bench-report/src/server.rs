//! PostgreSQL server metadata.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use tokio_postgres::Client;

use crate::meta::ServerInfo;

const REPORTED_SETTINGS: &[&str] = &[
    "shared_buffers",
    "work_mem",
    "effective_cache_size",
    "max_parallel_workers_per_gather",
    "max_connections",
];

/// Read the server version and the settings recorded with every report.
pub async fn fetch_server_info(client: &Client) -> Result<ServerInfo> {
    let version: String = client
        .query_one("SELECT version()", &[])
        .await
        .context("Failed to read server version")?
        .get(0);
    let version_num = client
        .query_one("SHOW server_version_num", &[])
        .await?
        .get::<_, String>(0)
        .parse::<i64>()
        .context("Unexpected server_version_num")?;

    let mut settings = BTreeMap::new();
    for name in REPORTED_SETTINGS {
        let value: String = client
            .query_one(&format!("SHOW {name}"), &[])
            .await
            .with_context(|| format!("Failed to read setting {name}"))?
            .get(0);
        settings.insert((*name).to_string(), value);
    }

    Ok(ServerInfo {
        version,
        version_num,
        settings,
    })
}
