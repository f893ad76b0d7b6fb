//! Reporting for tpcds-bench
//!
//! - [`generate_report`] writes a dated run directory with `summary.csv`,
//!   `queries.png` and `meta.json`, then regenerates the `README.md` index of all runs
//! - [`format_run_table`] / [`format_load_table`] render console summaries
//! - [`tune`] derives a `postgresql.conf` include from the host's hardware

mod chart;
mod environment;
mod meta;
mod readme;
mod run_dir;
mod server;
mod table;
pub mod tune;

pub use chart::render_query_chart;
pub use environment::{detect_host_profile, detect_system_info, DiskType, HostProfile, SystemInfo};
pub use meta::{compute_stats, ResultStats, RunMeta, ServerInfo};
pub use readme::update_readme;
pub use run_dir::make_run_dir;
pub use server::fetch_server_info;
pub use table::{format_load_table, format_run_table};

use anyhow::{Context, Result};
use bench_runner::StoredResult;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything a report is built from.
#[derive(Debug, Clone)]
pub struct ReportInput {
    pub benchmark: String,
    pub schema: String,
    pub date: NaiveDate,
    pub scale_factor: Option<u32>,
    pub rows: Vec<StoredResult>,
    pub server: ServerInfo,
    pub system: SystemInfo,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    query_id: u32,
    status: &'a str,
    duration_ms: f64,
    rows_returned: u64,
}

/// Write a new run directory under `base_dir` and refresh the index.
pub fn generate_report(base_dir: &Path, input: &ReportInput) -> Result<PathBuf> {
    if input.rows.is_empty() {
        anyhow::bail!(
            "No results in {}.bench_summary; run the workload suite first",
            input.schema
        );
    }

    let date = input.date.format("%Y-%m-%d").to_string();
    let run_dir = make_run_dir(base_dir, &date, input.scale_factor)?;

    let summary_path = run_dir.join("summary.csv");
    let mut writer = csv::Writer::from_path(&summary_path)
        .with_context(|| format!("Failed to create {}", summary_path.display()))?;
    for row in &input.rows {
        writer.serialize(CsvRow {
            query_id: row.query_id,
            status: &row.status,
            duration_ms: row.duration_ms,
            rows_returned: row.rows_returned,
        })?;
    }
    writer.flush()?;

    render_query_chart(&run_dir.join("queries.png"), &input.rows)?;

    let meta = RunMeta {
        benchmark: input.benchmark.clone(),
        schema: input.schema.clone(),
        date,
        scale_factor: input.scale_factor,
        run_ts: input.rows.first().map(|r| r.run_ts),
        postgresql: input.server.clone(),
        system: input.system.clone(),
        results: compute_stats(&input.rows),
    };
    let meta_path = run_dir.join("meta.json");
    std::fs::write(&meta_path, serde_json::to_string_pretty(&meta)?)
        .with_context(|| format!("Failed to write {}", meta_path.display()))?;

    update_readme(base_dir, &input.benchmark)?;
    info!("Report written to {}", run_dir.display());
    Ok(run_dir)
}
