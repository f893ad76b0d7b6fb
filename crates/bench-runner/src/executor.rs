//! Suite execution.

use bench_config::{keys, settings, ConfigProvider};
use bench_core::{format_duration, ErrorSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::error::RunError;
use crate::record::{write_summary_csv, WorkloadRecord, WorkloadStatus};
use crate::runner::StatementRunner;
use crate::split::split_statements;
use crate::store::ResultsStore;
use crate::suite::{workload_ids, WorkloadSource};

/// Default option string for EXPLAIN.
pub const DEFAULT_EXPLAIN_OPTIONS: &str = "COSTS";

/// What to do with each statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Execute,
    Explain { options: String },
}

impl RunMode {
    pub fn explain_default() -> Self {
        RunMode::Explain {
            options: DEFAULT_EXPLAIN_OPTIONS.to_string(),
        }
    }

    fn artifact_extension(&self) -> &'static str {
        match self {
            RunMode::Execute => "out",
            RunMode::Explain { .. } => "plan",
        }
    }
}

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: RunMode,
    /// Artifact directory. Falls back to `results_dir`.
    pub results_dir: Option<PathBuf>,
    /// Restrict the run to these ids; others are not reported at all.
    pub only: Option<Vec<u32>>,
}

impl RunOptions {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            results_dir: None,
            only: None,
        }
    }
}

/// A workload's result together with its artifact text.
#[derive(Debug, Clone)]
pub struct WorkloadOutput {
    pub record: WorkloadRecord,
    pub artifact: String,
}

/// Aggregate result of a run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub mode: RunMode,
    pub ok: usize,
    pub error: usize,
    pub skipped: usize,
    pub elapsed_secs: f64,
    pub artifact_dir: PathBuf,
    pub records: Vec<WorkloadRecord>,
    pub failed: ErrorSet,
}

impl RunSummary {
    pub fn summary(&self) -> String {
        let mut text = format!(
            "{} ok, {} error, {} skipped in {}; artifacts in {}",
            self.ok,
            self.error,
            self.skipped,
            format_duration(self.elapsed_secs),
            self.artifact_dir.display()
        );
        if !self.failed.is_empty() {
            text.push_str(&format!("; failed: {}", self.failed.to_vec().join(", ")));
        }
        text
    }
}

/// Workload Executor.
pub struct WorkloadExecutor {
    runner: Arc<dyn StatementRunner>,
    source: Arc<dyn WorkloadSource>,
    store: Arc<dyn ResultsStore>,
    config: Arc<dyn ConfigProvider>,
}

impl WorkloadExecutor {
    pub fn new(
        runner: Arc<dyn StatementRunner>,
        source: Arc<dyn WorkloadSource>,
        store: Arc<dyn ResultsStore>,
        config: Arc<dyn ConfigProvider>,
    ) -> Self {
        Self {
            runner,
            source,
            store,
            config,
        }
    }

    /// Run the suite in id order.
    ///
    /// EXECUTE runs replace the stored summary and append to the history.
    /// EXPLAIN runs only write artifacts and `summary.csv`.
    pub async fn run(&self, options: RunOptions) -> Result<RunSummary, RunError> {
        let start = Instant::now();
        let artifact_dir = settings::resolve_dir(
            self.config.as_ref(),
            keys::RESULTS_DIR,
            options.results_dir.as_ref(),
        )
        .await?;
        tokio::fs::create_dir_all(&artifact_dir)
            .await
            .map_err(|source| RunError::Artifact {
                path: artifact_dir.display().to_string(),
                source,
            })?;

        let run_id = match options.mode {
            RunMode::Execute => Some(self.store.begin_run().await.map_err(RunError::Store)?),
            RunMode::Explain { .. } => None,
        };
        info!(
            "Running workload suite ({:?}) with artifacts in {}",
            options.mode,
            artifact_dir.display()
        );

        let failed = ErrorSet::new();
        let mut records = Vec::new();

        for id in workload_ids() {
            if let Some(only) = &options.only {
                if !only.contains(&id) {
                    continue;
                }
            }

            let path = artifact_dir.join(format!(
                "query{}.{}",
                id,
                options.mode.artifact_extension()
            ));
            let record = match self.load(id).await {
                Err(e) => {
                    let message = e.to_string();
                    error!("{}", message);
                    write_artifact(&path, &format!("-- ERROR: {message}\n")).await?;
                    WorkloadRecord::failed(id, message)
                }
                Ok(None) => {
                    info!("Workload {} not prepared, skipping", id);
                    WorkloadRecord::skipped(id)
                }
                Ok(Some(text)) => {
                    let output = self.run_workload(id, &text, &options.mode).await;
                    write_artifact(&path, &output.artifact).await?;
                    output.record
                }
            };

            match record.status {
                WorkloadStatus::Ok => info!(
                    "Workload {}: OK in {:.1}ms ({} rows)",
                    id,
                    record.duration_ms(),
                    record.rows
                ),
                WorkloadStatus::Error => {
                    failed.insert(id.to_string());
                }
                _ => {}
            }

            if let Some(run_id) = run_id {
                self.store
                    .record(run_id, &record)
                    .await
                    .map_err(RunError::Store)?;
            }
            records.push(record);
        }

        write_summary_csv(&artifact_dir.join("summary.csv"), &records)?;

        let count = |status: WorkloadStatus| records.iter().filter(|r| r.status == status).count();
        let summary = RunSummary {
            mode: options.mode.clone(),
            ok: count(WorkloadStatus::Ok),
            error: count(WorkloadStatus::Error),
            skipped: count(WorkloadStatus::Skipped),
            elapsed_secs: start.elapsed().as_secs_f64(),
            artifact_dir,
            records,
            failed,
        };
        if summary.error > 0 {
            warn!("{}", summary.summary());
        } else {
            info!("{}", summary.summary());
        }
        Ok(summary)
    }

    /// Capture the plan of one workload without writing anything.
    pub async fn explain_single(&self, id: u32, options: &str) -> Result<WorkloadOutput, RunError> {
        if !workload_ids().contains(&id) {
            return Err(RunError::InvalidArgument(format!(
                "workload id must be between 1 and {}, got {id}",
                workload_ids().end()
            )));
        }
        let text = self.load(id).await?.ok_or(RunError::WorkloadNotFound(id))?;
        let mode = RunMode::Explain {
            options: options.to_string(),
        };
        Ok(self.run_workload(id, &text, &mode).await)
    }

    async fn load(&self, id: u32) -> Result<Option<String>, RunError> {
        self.source.load(id).await.map_err(|e| RunError::Source {
            id,
            message: format!("{e:#}"),
        })
    }

    /// Run statements in order, stopping at the first failure.
    async fn run_workload(&self, id: u32, text: &str, mode: &RunMode) -> WorkloadOutput {
        let statements = split_statements(text);
        let total = statements.len();
        let mut record = WorkloadRecord {
            id,
            status: WorkloadStatus::Running,
            duration: Duration::ZERO,
            rows: 0,
            error: None,
        };
        let mut artifact = String::new();

        if total == 0 {
            record.status = WorkloadStatus::Error;
            record.error = Some("workload contains no statements".to_string());
            artifact.push_str("-- ERROR: workload contains no statements\n");
            return WorkloadOutput { record, artifact };
        }

        for (index, sql) in statements.iter().enumerate() {
            if total > 1 {
                artifact.push_str(&format!("-- statement {} of {}\n", index + 1, total));
            }

            let start = Instant::now();
            let result = match mode {
                RunMode::Execute => self.runner.execute(sql).await.map(|out| {
                    record.rows += out.rows;
                    out.text
                }),
                RunMode::Explain { options } => self.runner.explain(sql, options).await,
            };
            record.duration += start.elapsed();

            match result {
                Ok(text) => {
                    artifact.push_str(&text);
                    if !text.is_empty() && !text.ends_with('\n') {
                        artifact.push('\n');
                    }
                }
                Err(e) => {
                    let message = format!("{e:#}");
                    error!(
                        "Workload {} statement {} of {} failed: {}",
                        id,
                        index + 1,
                        total,
                        message
                    );
                    artifact.push_str(&format!("-- ERROR: {message}\n"));
                    record.status = WorkloadStatus::Error;
                    record.error = Some(message);
                    break;
                }
            }
        }

        if record.status == WorkloadStatus::Running {
            record.status = WorkloadStatus::Ok;
        }
        WorkloadOutput { record, artifact }
    }
}

async fn write_artifact(path: &Path, content: &str) -> Result<(), RunError> {
    tokio::fs::write(path, content)
        .await
        .map_err(|source| RunError::Artifact {
            path: path.display().to_string(),
            source,
        })
}
