//! Load command handler.

use bench_config::{keys, settings, ConfigProvider};
use bench_postgresql::ConnectionOpts;
use bench_report::format_load_table;
use bulk_load::{BulkLoader, LoadOptions, PostgresJobExecutor};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::parse_timeout;

/// Arguments for `load`.
#[derive(Args, Clone, Debug, Default)]
pub struct LoadArgs {
    /// Directory with the generated .dat files (defaults to the stored data_dir)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Concurrent jobs per phase (defaults to load_workers, then the CPU count)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Partition count of the files (defaults to the stored value, then detection)
    #[arg(long)]
    pub parallel: Option<u32>,

    /// max_parallel_maintenance_workers for primary-key rebuilds
    #[arg(long)]
    pub maintenance_workers: Option<u32>,

    /// Fail a job that runs longer than this (e.g. "2h")
    #[arg(long)]
    pub job_timeout: Option<String>,

    /// Progress log file (defaults to load.log in the data directory)
    #[arg(long)]
    pub progress_log: Option<PathBuf>,
}

impl LoadArgs {
    pub fn options(&self) -> anyhow::Result<LoadOptions> {
        Ok(LoadOptions {
            destination: self.data_dir.clone(),
            workers: self.workers,
            parallelism: self.parallel,
            maintenance_workers: self.maintenance_workers,
            job_timeout: parse_timeout(self.job_timeout.as_deref(), "job-timeout")?,
            progress_log: self.progress_log.clone(),
            ..Default::default()
        })
    }
}

/// Run the load command.
pub async fn run_load(
    args: LoadArgs,
    conn: ConnectionOpts,
    config: Arc<dyn ConfigProvider>,
) -> anyhow::Result<()> {
    let options = args.options()?;
    settings::remember_dir(config.as_ref(), keys::DATA_DIR, args.data_dir.as_ref()).await?;
    settings::remember(config.as_ref(), keys::LOAD_WORKERS, args.workers).await?;

    info!("Loading into {} (schema {})", conn.display_url(), conn.schema);
    let executor = Arc::new(PostgresJobExecutor::new(conn));
    let loader = BulkLoader::new(executor, config);

    let report = loader.load(options).await?;
    println!("{}", format_load_table(&report));
    println!("{}", report.summary());

    if !report.success() {
        anyhow::bail!(
            "{} table(s) failed to load: {}",
            report.failed.len(),
            report.failed.to_vec().join(", ")
        );
    }
    Ok(())
}
