//! Report command handler.

use anyhow::Context;
use bench_config::{keys, settings, ConfigProvider};
use bench_postgresql::{connect, ConnectionOpts};
use bench_report::{detect_system_info, fetch_server_info, generate_report, ReportInput};
use bench_runner::{PostgresResultsStore, ResultsStore};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for `report`.
#[derive(Args, Clone, Debug)]
pub struct ReportArgs {
    /// Base directory holding one subdirectory per run
    #[arg(long, default_value = "results")]
    pub output_dir: PathBuf,

    /// Benchmark name used in README.md and meta.json
    #[arg(long, default_value = "tpcds")]
    pub benchmark: String,

    /// Scale factor of the run (defaults to the stored scale_factor)
    #[arg(long)]
    pub scale_factor: Option<u32>,
}

/// Run the report command.
pub async fn run_report(
    args: ReportArgs,
    conn: ConnectionOpts,
    config: Arc<dyn ConfigProvider>,
) -> anyhow::Result<()> {
    let scale_factor = match args.scale_factor {
        Some(sf) => Some(sf),
        None => settings::get_parsed(config.as_ref(), keys::SCALE_FACTOR).await?,
    };

    let client = connect(&conn).await?;
    let server = fetch_server_info(&client).await?;
    let store = PostgresResultsStore::new(client, &conn.schema)
        .await
        .context("Failed to open results tables")?;
    let rows = store.latest().await?;

    let input = ReportInput {
        benchmark: args.benchmark,
        schema: conn.schema.clone(),
        date: chrono::Local::now().date_naive(),
        scale_factor,
        rows,
        server,
        system: detect_system_info(),
    };
    let run_dir = generate_report(&args.output_dir, &input)?;
    println!("Report written to {}", run_dir.display());
    Ok(())
}
