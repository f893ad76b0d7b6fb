//! Command-line interface for tpcds-bench
//!
//! # Usage Examples
//!
//! ## Generate and load
//! ```bash
//! # Scale factor 10 with 8 dsdgen workers
//! tpcds-bench generate --scale-factor 10 --parallel 8 \
//!   --data-dir /data/tpcds --dsdgen /opt/tpcds-kit/tools/dsdgen
//!
//! # Load into the tpcds schema with 8 concurrent jobs per phase
//! tpcds-bench load --host db1 --dbname bench --workers 8
//! ```
//!
//! ## Workloads
//! ```bash
//! # Execute all 99 workloads
//! tpcds-bench run --query-dir ./queries --results-dir ./out
//!
//! # Plan of workload 72 only
//! tpcds-bench explain 72 --options "ANALYZE, BUFFERS"
//! ```
//!
//! ## Reports and tuning
//! ```bash
//! tpcds-bench report --output-dir ./results
//! tpcds-bench tune --pg-data /var/lib/postgresql/16/main --dry-run
//! ```
//!
//! Settings given once (data_dir, query_dir, results_dir, load_workers) are
//! kept in the configuration store and reused by later commands.

use bench_postgresql::ConnectionOpts;
use clap::{Parser, Subcommand};
use tpcds_bench::commands::{
    generate::{run_generate, GenerateArgs},
    load::{run_load, LoadArgs},
    pipeline::{run_pipeline, PipelineArgs},
    report::{run_report, ReportArgs},
    run::{run_explain, run_suite, ExplainArgs, RunArgs},
    tune::{run_tune, TuneArgs},
};
use tpcds_bench::{open_config_store, StoreOpts};

#[derive(Parser)]
#[command(name = "tpcds-bench")]
#[command(about = "TPC-DS benchmark harness for PostgreSQL")]
#[command(long_about = None)]
struct Cli {
    #[command(flatten)]
    conn: ConnectionOpts,

    #[command(flatten)]
    store: StoreOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the data files with parallel dsdgen workers
    Generate(GenerateArgs),

    /// Bulk load the generated files: truncate, copy, rebuild keys, analyze
    Load(LoadArgs),

    /// Execute the workload suite and record the results
    Run(RunArgs),

    /// Explain the workload suite, or a single workload
    Explain(ExplainArgs),

    /// Generate, load and run in one go
    Pipeline(PipelineArgs),

    /// Write a dated report of the latest run
    Report(ReportArgs),

    /// Write a postgresql.conf include sized for this host
    Tune(TuneArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Cli {
        conn,
        store,
        command,
    } = Cli::parse();

    match command {
        Commands::Tune(args) => run_tune(args),
        Commands::Generate(args) => {
            let config = open_config_store(&store, &conn).await?;
            run_generate(args, config).await
        }
        Commands::Load(args) => {
            let config = open_config_store(&store, &conn).await?;
            run_load(args, conn, config).await
        }
        Commands::Run(args) => {
            let config = open_config_store(&store, &conn).await?;
            run_suite(args, conn, config).await
        }
        Commands::Explain(args) => {
            let config = open_config_store(&store, &conn).await?;
            run_explain(args, conn, config).await
        }
        Commands::Pipeline(args) => {
            let config = open_config_store(&store, &conn).await?;
            run_pipeline(args, conn, config).await
        }
        Commands::Report(args) => {
            let config = open_config_store(&store, &conn).await?;
            run_report(args, conn, config).await
        }
    }
}
