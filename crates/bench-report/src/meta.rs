//! `meta.json` contents.

use bench_runner::StoredResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::environment::SystemInfo;

/// PostgreSQL server facts recorded with a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerInfo {
    pub version: String,
    pub version_num: i64,
    /// Selected settings (`SHOW` values) keyed by name.
    #[serde(flatten)]
    pub settings: BTreeMap<String, String>,
}

/// Aggregate timings of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultStats {
    pub total_queries: usize,
    pub ok_count: usize,
    pub error_count: usize,
    #[serde(default)]
    pub skipped_count: usize,
    pub total_duration_ms: f64,
    pub total_duration_s: f64,
    pub min_duration_ms: f64,
    pub max_duration_ms: f64,
    pub median_duration_ms: f64,
    pub fastest_query: Option<u32>,
    pub slowest_query: Option<u32>,
}

/// Contents of `meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub benchmark: String,
    pub schema: String,
    pub date: String,
    pub scale_factor: Option<u32>,
    pub run_ts: Option<DateTime<Utc>>,
    pub postgresql: ServerInfo,
    pub system: SystemInfo,
    pub results: ResultStats,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn median(sorted: &[f64]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2],
        n => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

/// Summarize stored rows. Skipped workloads count toward neither ok nor error;
/// the fastest and slowest workload are chosen among successful ones.
pub fn compute_stats(rows: &[StoredResult]) -> ResultStats {
    let mut durations: Vec<f64> = rows.iter().map(|r| r.duration_ms).collect();
    durations.sort_by(|a, b| a.total_cmp(b));
    let total: f64 = durations.iter().sum();

    let ok: Vec<&StoredResult> = rows.iter().filter(|r| r.status == "OK").collect();
    let fastest = ok
        .iter()
        .min_by(|a, b| a.duration_ms.total_cmp(&b.duration_ms))
        .map(|r| r.query_id);
    let slowest = ok
        .iter()
        .max_by(|a, b| a.duration_ms.total_cmp(&b.duration_ms))
        .map(|r| r.query_id);

    ResultStats {
        total_queries: rows.len(),
        ok_count: ok.len(),
        error_count: rows.iter().filter(|r| r.status == "ERROR").count(),
        skipped_count: rows.iter().filter(|r| r.status == "SKIPPED").count(),
        total_duration_ms: round_to(total, 2),
        total_duration_s: round_to(total / 1000.0, 1),
        min_duration_ms: round_to(durations.first().copied().unwrap_or(0.0), 2),
        max_duration_ms: round_to(durations.last().copied().unwrap_or(0.0), 2),
        median_duration_ms: round_to(median(&durations), 2),
        fastest_query: fastest,
        slowest_query: slowest,
    }
}
