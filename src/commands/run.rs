//! Run and explain command handlers.

use anyhow::Context;
use bench_config::{keys, settings, ConfigProvider};
use bench_postgresql::{connect, ConnectionOpts};
use bench_report::format_run_table;
use bench_runner::{
    DirectorySource, NullResultsStore, PostgresResultsStore, PostgresRunner, ResultsStore,
    RunMode, RunOptions, WorkloadExecutor, DEFAULT_EXPLAIN_OPTIONS,
};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::parse_timeout;

/// Where workloads come from and where their output goes.
#[derive(Args, Clone, Debug, Default)]
pub struct SuiteOpts {
    /// Directory with query<N>.sql files (defaults to the stored query_dir)
    #[arg(long)]
    pub query_dir: Option<PathBuf>,

    /// Directory for per-workload output and summary.csv (defaults to the stored results_dir)
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Cancel a statement that runs longer than this (e.g. "10m")
    #[arg(long)]
    pub statement_timeout: Option<String>,

    /// Only run these workload ids (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Option<Vec<u32>>,
}

impl SuiteOpts {
    pub fn options(&self, mode: RunMode) -> RunOptions {
        let mut options = RunOptions::new(mode);
        options.results_dir = self.results_dir.clone();
        options.only = self.only.clone();
        options
    }
}

/// Arguments for `run`.
#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub suite: SuiteOpts,
}

/// Arguments for `explain`.
#[derive(Args, Clone, Debug)]
pub struct ExplainArgs {
    /// Explain a single workload and print its plan
    pub query_id: Option<u32>,

    /// EXPLAIN option list, e.g. "ANALYZE, BUFFERS"
    #[arg(long, default_value = DEFAULT_EXPLAIN_OPTIONS)]
    pub options: String,

    #[command(flatten)]
    pub suite: SuiteOpts,
}

/// Build a workload executor against the benchmark database.
///
/// Explicit directories are stored for later commands.
pub async fn build_executor(
    suite: &SuiteOpts,
    conn: &ConnectionOpts,
    config: Arc<dyn ConfigProvider>,
    record_results: bool,
) -> anyhow::Result<WorkloadExecutor> {
    settings::remember_dir(config.as_ref(), keys::QUERY_DIR, suite.query_dir.as_ref()).await?;
    settings::remember_dir(config.as_ref(), keys::RESULTS_DIR, suite.results_dir.as_ref()).await?;
    let query_dir =
        settings::resolve_dir(config.as_ref(), keys::QUERY_DIR, suite.query_dir.as_ref()).await?;
    let timeout = parse_timeout(suite.statement_timeout.as_deref(), "statement-timeout")?;
    let runner = PostgresRunner::connect(conn, timeout).await?;

    let store: Arc<dyn ResultsStore> = if record_results {
        let client = connect(conn).await?;
        Arc::new(
            PostgresResultsStore::new(client, &conn.schema)
                .await
                .context("Failed to prepare results tables")?,
        )
    } else {
        Arc::new(NullResultsStore)
    };

    info!("Workloads from {}", query_dir.display());
    Ok(WorkloadExecutor::new(
        Arc::new(runner),
        Arc::new(DirectorySource::new(query_dir)),
        store,
        config,
    ))
}

/// Run the run command.
pub async fn run_suite(
    args: RunArgs,
    conn: ConnectionOpts,
    config: Arc<dyn ConfigProvider>,
) -> anyhow::Result<()> {
    let executor = build_executor(&args.suite, &conn, config, true).await?;
    let summary = executor.run(args.suite.options(RunMode::Execute)).await?;

    println!("{}", format_run_table(&summary));
    println!("{}", summary.summary());
    if summary.error > 0 {
        anyhow::bail!(
            "{} workload(s) failed: {}",
            summary.error,
            summary.failed.to_vec().join(", ")
        );
    }
    Ok(())
}

/// Run the explain command.
pub async fn run_explain(
    args: ExplainArgs,
    conn: ConnectionOpts,
    config: Arc<dyn ConfigProvider>,
) -> anyhow::Result<()> {
    let executor = build_executor(&args.suite, &conn, config, false).await?;

    if let Some(id) = args.query_id {
        let output = executor.explain_single(id, &args.options).await?;
        print!("{}", output.artifact);
        if let Some(error) = output.record.error {
            anyhow::bail!("Workload {} failed: {}", id, error);
        }
        return Ok(());
    }

    let mode = RunMode::Explain {
        options: args.options.clone(),
    };
    let summary = executor.run(args.suite.options(mode)).await?;
    println!("{}", format_run_table(&summary));
    println!("{}", summary.summary());
    if summary.error > 0 {
        anyhow::bail!("{} workload(s) failed to explain", summary.error);
    }
    Ok(())
}
