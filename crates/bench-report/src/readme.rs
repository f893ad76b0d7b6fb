//! `README.md` index of all runs.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::warn;

use crate::meta::RunMeta;
use crate::run_dir::is_run_dir_name;

/// Regenerate `<base>/README.md` from every run directory's `meta.json`.
///
/// Does nothing if no run has been recorded yet.
pub fn update_readme(base_dir: &Path, benchmark: &str) -> Result<()> {
    let mut names: Vec<String> = std::fs::read_dir(base_dir)
        .with_context(|| format!("Failed to list {}", base_dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| is_run_dir_name(name))
        .collect();
    names.sort_unstable_by(|a, b| b.cmp(a));

    let mut runs: Vec<(String, RunMeta)> = Vec::new();
    for name in names {
        let meta_path = base_dir.join(&name).join("meta.json");
        let Ok(content) = std::fs::read_to_string(&meta_path) else {
            continue;
        };
        match serde_json::from_str(&content) {
            Ok(meta) => runs.push((name, meta)),
            Err(e) => warn!("Ignoring {}: {}", meta_path.display(), e),
        }
    }

    let Some((latest_dir, latest)) = runs.first() else {
        return Ok(());
    };
    let res = &latest.results;
    let sf = latest
        .scale_factor
        .map(|sf| sf.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let total = format!("{:.1}s", res.total_duration_s);

    let mut lines = vec![
        format!("# {benchmark} Benchmark Results\n"),
        "## Latest Run\n".to_string(),
        format!(
            "**Date:** {} | **Scale Factor:** {} | **Total:** {} | **Status:** {}/{} OK\n",
            latest.date, sf, total, res.ok_count, res.total_queries
        ),
        format!("![Latest benchmark results](./{latest_dir}/queries.png)\n"),
        "| Metric | Value |".to_string(),
        "|--------|-------|".to_string(),
    ];
    let version = latest
        .postgresql
        .version
        .split(',')
        .next()
        .unwrap_or_default();
    lines.push(format!("| PostgreSQL | {version} |"));
    lines.push(format!("| Scale Factor | {sf} |"));
    lines.push(format!("| Total Time | {total} |"));
    lines.push(format!(
        "| Queries OK | {}/{} |",
        res.ok_count, res.total_queries
    ));
    if let (Some(fastest), Some(slowest)) = (res.fastest_query, res.slowest_query) {
        lines.push(format!(
            "| Fastest | Q{} ({:.0}ms) |",
            fastest, res.min_duration_ms
        ));
        lines.push(format!(
            "| Slowest | Q{} ({:.0}ms) |",
            slowest, res.max_duration_ms
        ));
        lines.push(format!("| Median | {:.0}ms |", res.median_duration_ms));
    }
    lines.push(format!("\nDetails: [summary.csv](./{latest_dir}/summary.csv)"));
    lines.push(String::new());

    if runs.len() > 1 {
        lines.push("## All Runs\n".to_string());
        lines.push("| Date | SF | Total | OK | Errors | Details |".to_string());
        lines.push("|------|----|-------|----|--------|---------|".to_string());
        for (dir, meta) in &runs {
            let r = &meta.results;
            lines.push(format!(
                "| [{}](./{}/) | {} | {:.1}s | {} | {} | [csv](./{}/summary.csv) [chart](./{}/queries.png) |",
                meta.date,
                dir,
                meta.scale_factor
                    .map(|sf| sf.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                r.total_duration_s,
                r.ok_count,
                r.error_count,
                dir,
                dir
            ));
        }
        lines.push(String::new());
    }

    lines.push("---".to_string());
    lines.push("*Generated by `tpcds-bench report`*".to_string());
    lines.push(String::new());

    let readme = base_dir.join("README.md");
    std::fs::write(&readme, lines.join("\n"))
        .with_context(|| format!("Failed to write {}", readme.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::SystemInfo;
    use crate::meta::{ResultStats, ServerInfo};
    use tempfile::TempDir;

    fn write_run(base: &Path, name: &str, ok: usize, total_s: f64) {
        let dir = base.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        let meta = RunMeta {
            benchmark: "TPC-DS".to_string(),
            schema: "tpcds".to_string(),
            date: name[..10].to_string(),
            scale_factor: Some(1),
            run_ts: None,
            postgresql: ServerInfo {
                version: "PostgreSQL 17.2 on x86_64-pc-linux-gnu, compiled by gcc".to_string(),
                ..Default::default()
            },
            system: SystemInfo::default(),
            results: ResultStats {
                total_queries: 99,
                ok_count: ok,
                error_count: 99 - ok,
                total_duration_s: total_s,
                fastest_query: Some(3),
                slowest_query: Some(72),
                ..Default::default()
            },
        };
        std::fs::write(dir.join("meta.json"), serde_json::to_string(&meta).unwrap()).unwrap();
    }

    #[test]
    fn test_latest_run_first() {
        let temp_dir = TempDir::new().unwrap();
        write_run(temp_dir.path(), "2026-01-01_sf1", 97, 120.0);
        write_run(temp_dir.path(), "2026-02-01_sf1", 99, 95.25);
        std::fs::create_dir_all(temp_dir.path().join("scratch")).unwrap();

        update_readme(temp_dir.path(), "TPC-DS").unwrap();
        let readme = std::fs::read_to_string(temp_dir.path().join("README.md")).unwrap();

        assert!(readme.starts_with("# TPC-DS Benchmark Results"));
        assert!(readme.contains("**Date:** 2026-02-01"));
        assert!(readme.contains("| PostgreSQL | PostgreSQL 17.2 on x86_64-pc-linux-gnu |"));
        assert!(readme.contains("| Fastest | Q3"));
        assert!(readme.contains("![Latest benchmark results](./2026-02-01_sf1/queries.png)"));
        assert!(readme.contains(
            "[csv](./2026-01-01_sf1/summary.csv) [chart](./2026-01-01_sf1/queries.png) |"
        ));
        let feb = readme.find("[2026-02-01]").unwrap();
        let jan = readme.find("[2026-01-01]").unwrap();
        assert!(feb < jan);
        assert!(!readme.contains("scratch"));
    }

    #[test]
    fn test_no_runs_no_readme() {
        let temp_dir = TempDir::new().unwrap();
        update_readme(temp_dir.path(), "TPC-DS").unwrap();
        assert!(!temp_dir.path().join("README.md").exists());
    }
}
