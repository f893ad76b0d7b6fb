//! Append-only job log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

use crate::job::Phase;

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Succeeded { rows: Option<u64> },
    Failed { message: String },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded { .. })
    }
}

/// One finished job.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub unit: String,
    pub phase: Phase,
    pub started_at: DateTime<Utc>,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    pub outcome: JobOutcome,
}

/// A table's failure in one phase. The message is the database's error text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    pub unit: String,
    pub phase: Phase,
    pub message: String,
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

/// Shared, append-only log of job starts and results.
///
/// Every entry is also written as one line to the progress file, if any.
#[derive(Default)]
pub struct JobLog {
    records: Mutex<Vec<JobRecord>>,
    progress: Option<Mutex<File>>,
}

impl JobLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log that additionally appends to a progress file.
    pub fn with_progress_file(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            records: Mutex::new(Vec::new()),
            progress: Some(Mutex::new(file)),
        })
    }

    /// Free-text progress line.
    pub fn note(&self, message: &str) {
        self.write_line(&format!("{} {}", Utc::now().to_rfc3339(), message));
    }

    pub fn started(&self, unit: &str, phase: Phase) {
        self.note(&format!("{unit} {phase} started"));
    }

    pub fn record(&self, record: JobRecord) {
        let line = match &record.outcome {
            JobOutcome::Succeeded { rows: Some(rows) } => format!(
                "{} {} ok {}ms rows={}",
                record.unit,
                record.phase,
                record.duration.as_millis(),
                rows
            ),
            JobOutcome::Succeeded { rows: None } => format!(
                "{} {} ok {}ms",
                record.unit,
                record.phase,
                record.duration.as_millis()
            ),
            JobOutcome::Failed { message } => format!(
                "{} {} FAILED {}ms: {}",
                record.unit,
                record.phase,
                record.duration.as_millis(),
                message
            ),
        };
        self.note(&line);
        lock(&self.records).push(record);
    }

    pub fn records(&self) -> Vec<JobRecord> {
        lock(&self.records).clone()
    }

    pub fn failures(&self) -> Vec<UnitFailure> {
        lock(&self.records)
            .iter()
            .filter_map(|r| match &r.outcome {
                JobOutcome::Failed { message } => Some(UnitFailure {
                    unit: r.unit.clone(),
                    phase: r.phase,
                    message: message.clone(),
                }),
                JobOutcome::Succeeded { .. } => None,
            })
            .collect()
    }

    fn write_line(&self, line: &str) {
        if let Some(progress) = &self.progress {
            let mut file = lock(progress);
            if let Err(e) = writeln!(file, "{line}") {
                warn!("Failed to write progress log: {}", e);
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
