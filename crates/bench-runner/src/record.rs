//! Per-workload results and the run summary file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::RunError;

/// Lifecycle of a workload within one run. Only the last three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkloadStatus {
    Pending,
    Running,
    Ok,
    Error,
    Skipped,
}

impl WorkloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadStatus::Pending => "PENDING",
            WorkloadStatus::Running => "RUNNING",
            WorkloadStatus::Ok => "OK",
            WorkloadStatus::Error => "ERROR",
            WorkloadStatus::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for WorkloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one workload.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadRecord {
    pub id: u32,
    pub status: WorkloadStatus,
    /// Time spent in statements, including the failing one.
    pub duration: Duration,
    /// Rows returned or affected across statements.
    pub rows: u64,
    /// Error text as reported by the database.
    pub error: Option<String>,
}

impl WorkloadRecord {
    pub fn skipped(id: u32) -> Self {
        Self {
            id,
            status: WorkloadStatus::Skipped,
            duration: Duration::ZERO,
            rows: 0,
            error: None,
        }
    }

    /// A workload that failed before any statement ran.
    pub fn failed(id: u32, message: impl Into<String>) -> Self {
        Self {
            id,
            status: WorkloadStatus::Error,
            duration: Duration::ZERO,
            rows: 0,
            error: Some(message.into()),
        }
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }
}

/// One line of `summary.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub query_id: u32,
    pub status: WorkloadStatus,
    pub duration_ms: f64,
    pub rows_returned: u64,
}

impl From<&WorkloadRecord> for SummaryRow {
    fn from(record: &WorkloadRecord) -> Self {
        Self {
            query_id: record.id,
            status: record.status,
            duration_ms: (record.duration_ms() * 1000.0).round() / 1000.0,
            rows_returned: record.rows,
        }
    }
}

/// Write `query_id,status,duration_ms,rows_returned` rows to `path`.
pub fn write_summary_csv(path: &Path, records: &[WorkloadRecord]) -> Result<(), RunError> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(SummaryRow::from(record))?;
    }
    writer.flush().map_err(|source| RunError::Artifact {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}
