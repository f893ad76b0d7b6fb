//! Phased load orchestration.

use bench_config::{keys, settings, ConfigProvider};
use bench_core::{format_duration, format_number, ErrorSet};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::catalog::{tpcds_tables, TableUnit};
use crate::error::LoadError;
use crate::executor::JobExecutor;
use crate::job::{LoadJob, Phase};
use crate::log::{JobLog, JobOutcome, JobRecord, UnitFailure};
use crate::pool::{run_job, run_phase};
use crate::source::{detect_parallelism, resolve_sources};
use crate::state::{UnitProgress, UnitState};

/// Settings for one load. Unset values come from the configuration store.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Directory holding the generated files. Falls back to `data_dir`.
    pub destination: Option<PathBuf>,
    /// Concurrent jobs per phase. Falls back to `load_workers`, then the CPU count.
    pub workers: Option<usize>,
    /// Partition count of the files. Falls back to `parallel`, then detection.
    pub parallelism: Option<u32>,
    /// `max_parallel_maintenance_workers` for key rebuilds. Defaults to CPUs / workers.
    pub maintenance_workers: Option<u32>,
    pub job_timeout: Option<Duration>,
    pub delimiter: u8,
    /// Progress log file. Defaults to `load.log` in the destination.
    pub progress_log: Option<PathBuf>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            destination: None,
            workers: None,
            parallelism: None,
            maintenance_workers: None,
            job_timeout: None,
            delimiter: b'|',
            progress_log: None,
        }
    }
}

/// Final state and timings of one table.
#[derive(Debug, Clone)]
pub struct UnitSummary {
    pub name: String,
    pub state: UnitState,
    pub rows_copied: Option<u64>,
    /// Planner estimate after analyze.
    pub estimated_rows: Option<u64>,
    pub durations: BTreeMap<Phase, Duration>,
}

/// Result of a load that ran all phases.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub destination: PathBuf,
    pub parallelism: u32,
    pub workers: usize,
    pub units: Vec<UnitSummary>,
    /// Every job in completion order.
    pub records: Vec<JobRecord>,
    pub failures: Vec<UnitFailure>,
    pub failed: ErrorSet,
    pub elapsed: Duration,
    /// Sum of post-analyze estimates.
    pub total_rows: u64,
}

impl LoadReport {
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn unit(&self, name: &str) -> Option<&UnitSummary> {
        self.units.iter().find(|u| u.name == name)
    }

    pub fn summary(&self) -> String {
        let analyzed = self
            .units
            .iter()
            .filter(|u| u.state == UnitState::Analyzed)
            .count();
        let mut text = format!(
            "Loaded {}/{} tables in {} (~{} rows, {} workers)",
            analyzed,
            self.units.len(),
            format_duration(self.elapsed.as_secs_f64()),
            format_number(self.total_rows),
            self.workers
        );
        if !self.success() {
            text.push_str(&format!(
                "; FAILED: {}",
                self.failed.to_vec().join(", ")
            ));
        }
        text
    }
}

/// Bulk Load Orchestrator.
pub struct BulkLoader {
    executor: Arc<dyn JobExecutor>,
    config: Arc<dyn ConfigProvider>,
    units: Vec<TableUnit>,
}

impl BulkLoader {
    /// Loader for the full TPC-DS catalog.
    pub fn new(executor: Arc<dyn JobExecutor>, config: Arc<dyn ConfigProvider>) -> Self {
        Self {
            executor,
            config,
            units: tpcds_tables(),
        }
    }

    pub fn with_units(mut self, units: Vec<TableUnit>) -> Self {
        self.units = units;
        self
    }

    pub fn units(&self) -> &[TableUnit] {
        &self.units
    }

    /// Run setup, copy, rebuild and analyze with a full barrier between each.
    ///
    /// Returns `Err` only for failures that stop the whole load; per-table
    /// failures are reported through [`LoadReport::failed`].
    pub async fn load(&self, options: LoadOptions) -> Result<LoadReport, LoadError> {
        let start = Instant::now();
        let config = self.config.as_ref();

        let destination =
            settings::resolve_dir(config, keys::DATA_DIR, options.destination.as_ref()).await?;

        let workers = match options.workers {
            Some(w) => w,
            None => settings::get_parsed::<usize>(config, keys::LOAD_WORKERS)
                .await?
                .unwrap_or_else(num_cpus::get),
        };
        if workers < 1 {
            return Err(LoadError::InvalidArgument(
                "worker count must be at least 1".to_string(),
            ));
        }

        let parallelism = match options.parallelism {
            Some(p) => p,
            None => match settings::get_parsed::<u32>(config, keys::PARALLEL).await? {
                Some(p) => p,
                None => detect_parallelism(&destination, &self.units)?,
            },
        };
        let mut sources = resolve_sources(&destination, &self.units, parallelism)?;

        let maintenance_workers = options
            .maintenance_workers
            .unwrap_or_else(|| (num_cpus::get() / workers).max(1) as u32);

        let log_path = options
            .progress_log
            .clone()
            .unwrap_or_else(|| destination.join("load.log"));
        let log = Arc::new(JobLog::with_progress_file(&log_path)?);
        log.note(&format!(
            "load started: {} tables from {} (parallelism {}, {} workers)",
            self.units.len(),
            destination.display(),
            parallelism,
            workers
        ));
        info!(
            "Loading {} tables from {} with {} workers (parallelism {})",
            self.units.len(),
            destination.display(),
            workers,
            parallelism
        );

        let mut progress: BTreeMap<String, UnitProgress> = self
            .units
            .iter()
            .map(|u| (u.name.clone(), UnitProgress::default()))
            .collect();
        let failed = ErrorSet::new();

        // Setup
        self.check(Phase::DropConstraints, &log).await?;
        for unit in &self.units {
            let record = run_job(
                self.executor.as_ref(),
                LoadJob::setup(unit),
                options.job_timeout,
                &log,
            )
            .await;
            if let JobOutcome::Failed { message } = &record.outcome {
                log.note("load aborted");
                return Err(LoadError::Pipeline {
                    phase: Phase::DropConstraints,
                    message: format!("{}: {}", unit.name, message),
                });
            }
            apply(&mut progress, &failed, &record);
        }

        // Copy
        self.check(Phase::Copy, &log).await?;
        let jobs = self
            .units
            .iter()
            .map(|u| {
                let files = sources.remove(&u.name).unwrap_or_default();
                LoadJob::copy(u, files, options.delimiter)
            })
            .collect();
        for record in self.phase(Phase::Copy, jobs, workers, &options, &log).await? {
            apply(&mut progress, &failed, &record);
        }

        // Rebuild
        self.check(Phase::RebuildConstraints, &log).await?;
        let mut jobs = Vec::new();
        for unit in &self.units {
            match LoadJob::rebuild(unit, maintenance_workers) {
                Some(job) => jobs.push(job),
                None => {
                    if let Some(p) = progress.get_mut(&unit.name) {
                        p.skip_rebuild();
                    }
                }
            }
        }
        for record in self
            .phase(Phase::RebuildConstraints, jobs, workers, &options, &log)
            .await?
        {
            apply(&mut progress, &failed, &record);
        }

        // Analyze
        self.check(Phase::Analyze, &log).await?;
        let jobs = self.units.iter().map(LoadJob::analyze).collect();
        for record in self.phase(Phase::Analyze, jobs, workers, &options, &log).await? {
            apply(&mut progress, &failed, &record);
        }

        let records = log.records();
        let units: Vec<UnitSummary> = self
            .units
            .iter()
            .map(|u| summarize(u, &progress, &records))
            .collect();
        let total_rows = units
            .iter()
            .map(|u| u.estimated_rows.or(u.rows_copied).unwrap_or(0))
            .sum();

        let report = LoadReport {
            destination,
            parallelism,
            workers,
            units,
            failures: log.failures(),
            records,
            failed,
            elapsed: start.elapsed(),
            total_rows,
        };

        log.note(&report.summary());
        if report.success() {
            info!("{}", report.summary());
        } else {
            warn!("{}", report.summary());
        }
        Ok(report)
    }

    async fn check(&self, phase: Phase, log: &JobLog) -> Result<(), LoadError> {
        if let Err(e) = self.executor.check().await {
            error!("Cannot start {} phase: {:#}", phase, e);
            log.note(&format!("{phase} phase could not start: {e:#}"));
            return Err(LoadError::Pipeline {
                phase,
                message: format!("{e:#}"),
            });
        }
        Ok(())
    }

    async fn phase(
        &self,
        phase: Phase,
        jobs: Vec<LoadJob>,
        workers: usize,
        options: &LoadOptions,
        log: &Arc<JobLog>,
    ) -> Result<Vec<JobRecord>, LoadError> {
        let phase_start = Instant::now();
        let records = run_phase(
            phase,
            jobs,
            Arc::clone(&self.executor),
            workers,
            options.job_timeout,
            Arc::clone(log),
        )
        .await?;
        let failures = records.iter().filter(|r| !r.outcome.is_success()).count();
        log.note(&format!(
            "{} phase finished in {}ms ({} failed)",
            phase,
            phase_start.elapsed().as_millis(),
            failures
        ));
        Ok(records)
    }
}

fn apply(progress: &mut BTreeMap<String, UnitProgress>, failed: &ErrorSet, record: &JobRecord) {
    let succeeded = record.outcome.is_success();
    if let Some(p) = progress.get_mut(&record.unit) {
        p.finish(record.phase, succeeded);
    }
    if !succeeded {
        failed.insert(record.unit.clone());
    }
}

fn summarize(
    unit: &TableUnit,
    progress: &BTreeMap<String, UnitProgress>,
    records: &[JobRecord],
) -> UnitSummary {
    let mut summary = UnitSummary {
        name: unit.name.clone(),
        state: progress
            .get(&unit.name)
            .map(|p| p.state())
            .unwrap_or(UnitState::Pending),
        rows_copied: None,
        estimated_rows: None,
        durations: BTreeMap::new(),
    };
    for record in records.iter().filter(|r| r.unit == unit.name) {
        summary.durations.insert(record.phase, record.duration);
        if let JobOutcome::Succeeded { rows } = record.outcome {
            match record.phase {
                Phase::Copy => summary.rows_copied = rows,
                Phase::Analyze => summary.estimated_rows = rows,
                _ => {}
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::JobOutput;
    use anyhow::Result;
    use async_trait::async_trait;
    use bench_config::MemoryConfigStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeExecutor {
        fail: Vec<(String, Phase)>,
        fail_check_after: Option<usize>,
        checks: AtomicUsize,
        in_flight_copies: AtomicUsize,
        peak_copies: AtomicUsize,
        events: Mutex<Vec<(String, Phase)>>,
    }

    impl FakeExecutor {
        fn failing(unit: &str, phase: Phase) -> Self {
            Self {
                fail: vec![(unit.to_string(), phase)],
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl JobExecutor for FakeExecutor {
        async fn check(&self) -> Result<()> {
            let n = self.checks.fetch_add(1, Ordering::SeqCst);
            match self.fail_check_after {
                Some(limit) if n >= limit => anyhow::bail!("connection refused"),
                _ => Ok(()),
            }
        }

        async fn execute(&self, job: &LoadJob) -> Result<JobOutput> {
            self.events
                .lock()
                .unwrap()
                .push((job.unit.clone(), job.phase));
            if job.phase == Phase::Copy {
                let now = self.in_flight_copies.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak_copies.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                self.in_flight_copies.fetch_sub(1, Ordering::SeqCst);
            }
            if self.fail.contains(&(job.unit.clone(), job.phase)) {
                anyhow::bail!("ERROR: could not extend file \"base/16384/24576\": No space left on device");
            }
            Ok(JobOutput {
                rows: match job.phase {
                    Phase::Copy | Phase::Analyze => Some(100),
                    _ => None,
                },
            })
        }
    }

    fn data_dir() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for unit in tpcds_tables() {
            std::fs::write(temp_dir.path().join(format!("{}.dat", unit.name)), "1|x|\n").unwrap();
        }
        temp_dir
    }

    fn options(dir: &TempDir, workers: usize) -> LoadOptions {
        LoadOptions {
            destination: Some(dir.path().to_path_buf()),
            workers: Some(workers),
            ..Default::default()
        }
    }

    fn loader(executor: Arc<FakeExecutor>) -> BulkLoader {
        BulkLoader::new(executor, Arc::new(MemoryConfigStore::new()))
    }

    #[tokio::test]
    async fn test_all_units_analyzed() {
        let dir = data_dir();
        let executor = Arc::new(FakeExecutor::default());
        let report = loader(Arc::clone(&executor))
            .load(options(&dir, 4))
            .await
            .unwrap();

        assert!(report.success());
        assert_eq!(report.parallelism, 1);
        assert_eq!(report.units.len(), 25);
        assert!(report.units.iter().all(|u| u.state == UnitState::Analyzed));
        assert_eq!(report.total_rows, 2500);
        // dbgen_version has no key, so 24 rebuild jobs.
        let rebuilds = report
            .records
            .iter()
            .filter(|r| r.phase == Phase::RebuildConstraints)
            .count();
        assert_eq!(rebuilds, 24);
        assert!(dir.path().join("load.log").exists());
    }

    #[tokio::test]
    async fn test_copy_concurrency_bounded_by_workers() {
        let dir = data_dir();
        let executor = Arc::new(FakeExecutor::default());
        loader(Arc::clone(&executor))
            .load(options(&dir, 4))
            .await
            .unwrap();

        let peak = executor.peak_copies.load(Ordering::SeqCst);
        assert!(peak <= 4, "peak concurrency {peak}");
        assert!(peak >= 2, "copies did not overlap");
    }

    #[tokio::test]
    async fn test_phases_separated_by_barriers() {
        let dir = data_dir();
        let executor = Arc::new(FakeExecutor::default());
        loader(Arc::clone(&executor))
            .load(options(&dir, 8))
            .await
            .unwrap();

        let phases: Vec<Phase> = executor.events.lock().unwrap().iter().map(|e| e.1).collect();
        assert!(phases.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_failed_copy_is_isolated() {
        let dir = data_dir();
        let executor = Arc::new(FakeExecutor::failing("store_sales", Phase::Copy));
        let report = loader(Arc::clone(&executor))
            .load(options(&dir, 4))
            .await
            .unwrap();

        assert!(!report.success());
        assert_eq!(report.failed.to_vec(), vec!["store_sales".to_string()]);
        assert_eq!(
            report.unit("store_sales").unwrap().state,
            UnitState::Failed(Phase::Copy)
        );
        let analyzed = report
            .units
            .iter()
            .filter(|u| u.state == UnitState::Analyzed)
            .count();
        assert_eq!(analyzed, 24);
        assert!(report.failures[0].message.contains("No space left on device"));
        assert!(report.summary().contains("FAILED: store_sales"));

        // Dependent phases are still attempted for the failed table.
        let events = executor.events.lock().unwrap();
        assert!(events.contains(&("store_sales".to_string(), Phase::RebuildConstraints)));
        assert!(events.contains(&("store_sales".to_string(), Phase::Analyze)));
    }

    #[tokio::test]
    async fn test_missing_sources_touch_nothing() {
        let dir = data_dir();
        std::fs::remove_file(dir.path().join("web_site.dat")).unwrap();
        let executor = Arc::new(FakeExecutor::default());

        let err = loader(Arc::clone(&executor))
            .load(options(&dir, 4))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::SourceNotFound(ref m) if m.contains("web_site")));
        assert!(executor.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stored_parallelism_must_match_files() {
        let dir = data_dir();
        let executor = Arc::new(FakeExecutor::default());
        let config = Arc::new(MemoryConfigStore::with_values([(keys::PARALLEL, "4")]));

        let err = BulkLoader::new(executor.clone(), config)
            .load(options(&dir, 4))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::SourceNotFound(_)));
        assert!(executor.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_setup_failure_aborts() {
        let dir = data_dir();
        let executor = Arc::new(FakeExecutor::failing("item", Phase::DropConstraints));
        let err = loader(Arc::clone(&executor))
            .load(options(&dir, 4))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LoadError::Pipeline { phase: Phase::DropConstraints, .. }
        ));
        let events = executor.events.lock().unwrap();
        assert!(events.iter().all(|e| e.1 == Phase::DropConstraints));
    }

    #[tokio::test]
    async fn test_unreachable_database_aborts_phase() {
        let dir = data_dir();
        let executor = Arc::new(FakeExecutor {
            fail_check_after: Some(2),
            ..Default::default()
        });
        let err = loader(Arc::clone(&executor))
            .load(options(&dir, 4))
            .await
            .unwrap_err();

        match err {
            LoadError::Pipeline { phase, message } => {
                assert_eq!(phase, Phase::RebuildConstraints);
                assert_eq!(message, "connection refused");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_zero_workers_rejected() {
        let dir = data_dir();
        let err = loader(Arc::new(FakeExecutor::default()))
            .load(options(&dir, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidArgument(_)));
    }
}
