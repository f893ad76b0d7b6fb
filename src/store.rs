//! Configuration store selection.

use anyhow::Context;
use bench_config::{ConfigProvider, FileConfigStore, PostgresConfigStore};
use bench_postgresql::{connect, ConnectionOpts};
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Where persisted settings live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigStoreKind {
    /// JSON file on the local machine
    File,
    /// `<schema>.config` table in the benchmark database
    Postgres,
}

/// Configuration store options shared by every command.
#[derive(Args, Clone, Debug)]
pub struct StoreOpts {
    /// Configuration store backend
    #[arg(long, value_enum, default_value = "file", global = true)]
    pub config_store: ConfigStoreKind,

    /// Configuration file used by the file store
    #[arg(
        long,
        default_value = ".tpcds-bench/config.json",
        env = "TPCDS_BENCH_CONFIG",
        global = true
    )]
    pub config_file: PathBuf,
}

/// Open the selected configuration store.
pub async fn open_config_store(
    opts: &StoreOpts,
    conn: &ConnectionOpts,
) -> anyhow::Result<Arc<dyn ConfigProvider>> {
    match opts.config_store {
        ConfigStoreKind::File => {
            debug!("Using configuration file {}", opts.config_file.display());
            Ok(Arc::new(FileConfigStore::new(opts.config_file.clone())))
        }
        ConfigStoreKind::Postgres => {
            debug!("Using configuration table in schema {}", conn.schema);
            let client = connect(conn).await?;
            let store = PostgresConfigStore::new(client, &conn.schema)
                .await
                .context("Failed to open configuration table")?;
            Ok(Arc::new(store))
        }
    }
}
