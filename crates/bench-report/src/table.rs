//! Console tables for run and load results.

use bench_core::{format_duration, format_millis, format_number};
use bench_runner::{RunSummary, WorkloadStatus};
use bulk_load::{LoadReport, Phase, UnitState};
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};

fn millis(duration: Option<&std::time::Duration>) -> String {
    duration
        .map(|d| format_millis(d.as_secs_f64() * 1000.0))
        .unwrap_or_else(|| "-".to_string())
}

/// Format a workload run as a table. Skipped workloads are counted, not listed.
pub fn format_run_table(summary: &RunSummary) -> String {
    let mut output = String::new();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Query", "Status", "Duration", "Rows", "Error"]);

    for record in &summary.records {
        let status_cell = match record.status {
            WorkloadStatus::Ok => Cell::new("OK").fg(Color::Green),
            WorkloadStatus::Error => Cell::new("ERROR").fg(Color::Red),
            WorkloadStatus::Skipped => continue,
            other => Cell::new(other.as_str()),
        };
        let error = record
            .error
            .as_deref()
            .map(|e| e.lines().next().unwrap_or_default().to_string())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(format!("Q{}", record.id)),
            status_cell,
            Cell::new(format_millis(record.duration_ms())),
            Cell::new(format_number(record.rows)),
            Cell::new(error),
        ]);
    }

    let total_ms: f64 = summary.records.iter().map(|r| r.duration_ms()).sum();
    table.add_row(vec![
        Cell::new("TOTAL").fg(Color::Cyan),
        Cell::new(format!("{}/{} OK", summary.ok, summary.ok + summary.error)),
        Cell::new(format_millis(total_ms)),
        Cell::new(""),
        Cell::new(format!("{} skipped", summary.skipped)),
    ]);

    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\nWall clock: {}  Artifacts: {}\n",
        format_duration(summary.elapsed_secs),
        summary.artifact_dir.display()
    ));
    output
}

/// Format a load as a per-table phase timing table.
pub fn format_load_table(report: &LoadReport) -> String {
    let mut output = String::new();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Table", "Rows", "Copy", "Rebuild", "Analyze", "State",
    ]);

    for unit in &report.units {
        let state_cell = match unit.state {
            UnitState::Analyzed => Cell::new("ANALYZED").fg(Color::Green),
            UnitState::Failed(phase) => Cell::new(format!("FAILED ({phase})")).fg(Color::Red),
            other => Cell::new(format!("{other:?}").to_uppercase()),
        };
        let rows = unit
            .estimated_rows
            .or(unit.rows_copied)
            .map(format_number)
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(&unit.name),
            Cell::new(rows),
            Cell::new(millis(unit.durations.get(&Phase::Copy))),
            Cell::new(millis(unit.durations.get(&Phase::RebuildConstraints))),
            Cell::new(millis(unit.durations.get(&Phase::Analyze))),
            state_cell,
        ]);
    }

    table.add_row(vec![
        Cell::new("TOTAL").fg(Color::Cyan),
        Cell::new(format_number(report.total_rows)),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(format!(
            "{}/{}",
            report.units.len() - report.failed.len(),
            report.units.len()
        )),
    ]);

    output.push_str(&table.to_string());
    output.push_str(&format!("\n{}\n", report.summary()));

    let failures = &report.failures;
    if !failures.is_empty() {
        output.push_str("\nFailures:\n");
        for failure in failures {
            output.push_str(&format!(
                "  {} ({}): {}\n",
                failure.unit, failure.phase, failure.message
            ));
        }
    }
    output
}
