//! Pipeline command handler.

use bench_config::{keys, settings, ConfigProvider};
use bench_pipeline::{PipelineConfig, PipelineDriver};
use bench_postgresql::ConnectionOpts;
use bench_report::{format_load_table, format_run_table};
use bench_runner::RunMode;
use bulk_load::{BulkLoader, PostgresJobExecutor};
use clap::Args;
use datagen::Generator;
use std::sync::Arc;
use tracing::info;

use super::generate::GenerateArgs;
use super::load::LoadArgs;
use super::run::{build_executor, SuiteOpts};

/// Arguments for `pipeline`.
#[derive(Args, Clone, Debug)]
pub struct PipelineArgs {
    #[command(flatten)]
    pub generate: GenerateArgs,

    /// Concurrent load jobs per phase
    #[arg(long = "load-workers")]
    pub load_workers: Option<usize>,

    /// Fail a load job that runs longer than this (e.g. "2h")
    #[arg(long)]
    pub job_timeout: Option<String>,

    #[command(flatten)]
    pub suite: SuiteOpts,

    /// Reuse the data already in the data directory
    #[arg(long)]
    pub skip_generate: bool,

    /// Reuse the tables already loaded
    #[arg(long)]
    pub skip_load: bool,

    /// Stop after loading
    #[arg(long)]
    pub skip_run: bool,

    /// Do not run workloads when any table failed to load
    #[arg(long)]
    pub fail_on_load_errors: bool,
}

impl PipelineArgs {
    pub fn config(&self) -> anyhow::Result<PipelineConfig> {
        let load = LoadArgs {
            data_dir: self.generate.data_dir.clone(),
            workers: self.load_workers,
            job_timeout: self.job_timeout.clone(),
            ..Default::default()
        };
        Ok(PipelineConfig {
            generate: (!self.skip_generate).then(|| self.generate.request()),
            load: if self.skip_load {
                None
            } else {
                Some(load.options()?)
            },
            run: (!self.skip_run).then(|| self.suite.options(RunMode::Execute)),
            fail_on_load_errors: self.fail_on_load_errors,
        })
    }
}

/// Run the pipeline command.
pub async fn run_pipeline(
    args: PipelineArgs,
    conn: ConnectionOpts,
    config: Arc<dyn ConfigProvider>,
) -> anyhow::Result<()> {
    let pipeline_config = args.config()?;
    settings::remember(config.as_ref(), keys::LOAD_WORKERS, args.load_workers).await?;
    info!(
        "Benchmark pipeline against {}: {}",
        conn.display_url(),
        pipeline_config.stages().join(", ")
    );

    let generator = Generator::new(Arc::new(args.generate.dsdgen.launcher()?), config.clone());
    let loader = BulkLoader::new(Arc::new(PostgresJobExecutor::new(conn.clone())), config.clone());
    let executor = build_executor(&args.suite, &conn, config, !args.skip_run).await?;

    let driver = PipelineDriver::new(generator, loader, executor);
    let report = driver.run(pipeline_config).await?;

    if let Some(load) = &report.load {
        println!("{}", format_load_table(load));
    }
    if let Some(run) = &report.run {
        println!("{}", format_run_table(run));
    }
    println!("{}", report.summary());

    if !report.passed() {
        anyhow::bail!("Benchmark pipeline finished with failures");
    }
    Ok(())
}
