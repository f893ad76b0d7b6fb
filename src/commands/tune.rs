//! Tune command handler.

use anyhow::Context;
use bench_report::{detect_host_profile, tune};
use clap::Args;
use std::path::PathBuf;

/// Arguments for `tune`.
#[derive(Args, Clone, Debug)]
pub struct TuneArgs {
    /// PostgreSQL data directory; its filesystem decides the disk settings
    #[arg(long, env = "PGDATA")]
    pub pg_data: Option<PathBuf>,

    /// Output file
    #[arg(long, default_value = "postgresql.tpcds.conf")]
    pub output: PathBuf,

    /// Print the settings instead of writing the file
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the tune command.
pub fn run_tune(args: TuneArgs) -> anyhow::Result<()> {
    let disk_path = args.pg_data.clone().unwrap_or_else(|| PathBuf::from("/"));
    let profile = detect_host_profile(&disk_path);
    tracing::info!("Detected hardware: {}", profile.summary());

    let settings = tune::calculate(&profile);
    let generated_on = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let text = tune::render(
        &settings,
        &profile,
        &args.output,
        args.pg_data.as_deref(),
        &generated_on,
    );

    if args.dry_run {
        print!("{text}");
        return Ok(());
    }
    std::fs::write(&args.output, text)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    println!("Wrote {} ({} settings)", args.output.display(), settings.len());
    Ok(())
}
