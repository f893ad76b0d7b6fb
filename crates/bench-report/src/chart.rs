//! `queries.png`: one bar per workload, coloured by status.

use anyhow::{anyhow, Result};
use bench_runner::StoredResult;
use plotters::prelude::*;
use std::path::Path;

const OK_COLOR: RGBColor = RGBColor(0x4C, 0xAF, 0x50);
const ERROR_COLOR: RGBColor = RGBColor(0xF4, 0x43, 0x36);
const SKIPPED_COLOR: RGBColor = RGBColor(0xBD, 0xBD, 0xBD);
const CLIPPED_COLOR: RGBColor = RGBColor(0xB7, 0x1C, 0x1C);
const GRID_COLOR: RGBColor = RGBColor(0xE0, 0xE0, 0xE0);

const HEIGHT: u32 = 600;
const MARGIN: i32 = 40;
const SLOT: u32 = 18;

/// Height the bars are scaled to.
///
/// When the slowest workload is more than three times the 95th percentile the
/// axis is capped at twice the percentile; taller bars are clipped and marked.
fn y_cap(durations: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = durations.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let max = sorted.last().copied().unwrap_or(0.0);
    let p95 = if sorted.len() >= 5 {
        sorted[sorted.len() * 95 / 100]
    } else {
        max
    };
    if p95 > 0.0 && max > 3.0 * p95 {
        p95 * 2.0
    } else {
        max
    }
}

fn bar_color(status: &str) -> RGBColor {
    match status {
        "OK" => OK_COLOR,
        "SKIPPED" => SKIPPED_COLOR,
        _ => ERROR_COLOR,
    }
}

/// Render a bar chart of per-workload duration into `path`.
pub fn render_query_chart(path: &Path, rows: &[StoredResult]) -> Result<()> {
    let width = (rows.len() as u32 * SLOT + 2 * MARGIN as u32).max(1400);
    let root = BitMapBackend::new(path, (width, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| anyhow!("Failed to draw {}: {}", path.display(), e))?;

    let durations: Vec<f64> = rows.iter().map(|r| r.duration_ms).collect();
    let cap = y_cap(&durations);
    let left = MARGIN;
    let right = width as i32 - MARGIN;
    let top = MARGIN;
    let baseline = HEIGHT as i32 - MARGIN;
    let plot_height = f64::from(baseline - top);
    let slot = f64::from(right - left) / rows.len().max(1) as f64;

    for step in 1..=4 {
        let y = baseline - (plot_height * f64::from(step) / 4.0) as i32;
        root.draw(&PathElement::new(vec![(left, y), (right, y)], GRID_COLOR))
            .map_err(|e| anyhow!("Failed to draw {}: {}", path.display(), e))?;
    }

    for (i, row) in rows.iter().enumerate() {
        let x0 = left + (slot * (i as f64 + 0.1)) as i32;
        let x1 = left + (slot * (i as f64 + 0.9)) as i32;
        let clipped = cap > 0.0 && row.duration_ms > cap;
        let height = if cap > 0.0 {
            (row.duration_ms.min(cap * 1.05) / (cap * 1.05) * plot_height) as i32
        } else {
            0
        };
        // Zero-length workloads still get a visible sliver.
        let y = baseline - height.max(1);
        root.draw(&Rectangle::new(
            [(x0, y), (x1, baseline)],
            bar_color(&row.status).filled(),
        ))
        .map_err(|e| anyhow!("Failed to draw {}: {}", path.display(), e))?;
        if clipped {
            root.draw(&Rectangle::new([(x0, y), (x1, y + 4)], CLIPPED_COLOR.filled()))
                .map_err(|e| anyhow!("Failed to draw {}: {}", path.display(), e))?;
        }
    }

    root.draw(&PathElement::new(
        vec![(left, baseline), (right, baseline)],
        BLACK,
    ))
    .map_err(|e| anyhow!("Failed to draw {}: {}", path.display(), e))?;
    root.present()
        .map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn row(query_id: u32, status: &str, duration_ms: f64) -> StoredResult {
        StoredResult {
            run_id: 1,
            query_id,
            status: status.to_string(),
            duration_ms,
            rows_returned: 1,
            run_ts: Utc::now(),
        }
    }

    #[test]
    fn test_outlier_caps_axis() {
        let mut durations = vec![10.0; 20];
        durations.push(5000.0);
        assert_eq!(y_cap(&durations), 20.0);

        assert_eq!(y_cap(&[10.0, 12.0, 25.0]), 25.0);
        assert_eq!(y_cap(&[]), 0.0);
    }

    #[test]
    fn test_status_colors() {
        assert_eq!(bar_color("OK"), OK_COLOR);
        assert_eq!(bar_color("ERROR"), ERROR_COLOR);
        assert_eq!(bar_color("SKIPPED"), SKIPPED_COLOR);
    }

    #[test]
    fn test_chart_written() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("queries.png");
        let rows: Vec<StoredResult> = (1..=99)
            .map(|id| match id {
                5 => row(id, "ERROR", 0.0),
                72 => row(id, "OK", 90_000.0),
                _ => row(id, "OK", f64::from(id) * 3.0),
            })
            .collect();

        render_query_chart(&path, &rows).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
    }
}
