//! Bounded concurrent execution of one phase.

use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::error::LoadError;
use crate::executor::JobExecutor;
use crate::job::{LoadJob, Phase};
use crate::log::{JobLog, JobOutcome, JobRecord};

/// Run one job with an optional time limit and append its record to `log`.
pub(crate) async fn run_job(
    executor: &dyn JobExecutor,
    job: LoadJob,
    timeout: Option<Duration>,
    log: &JobLog,
) -> JobRecord {
    log.started(&job.unit, job.phase);
    let started_at = Utc::now();
    let start = Instant::now();

    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, executor.execute(&job)).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!("timed out after {:?}", limit)),
        },
        None => executor.execute(&job).await,
    };

    let outcome = match result {
        Ok(output) => JobOutcome::Succeeded { rows: output.rows },
        Err(e) => {
            error!("{} {} failed: {:#}", job.unit, job.phase, e);
            JobOutcome::Failed {
                message: format!("{e:#}"),
            }
        }
    };
    let record = JobRecord {
        unit: job.unit,
        phase: job.phase,
        started_at,
        duration: start.elapsed(),
        outcome,
    };
    log.record(record.clone());
    record
}

/// Run every job with at most `workers` in flight and wait for all of them.
///
/// Each job's result is appended to `log` as it finishes. Individual job
/// failures never stop the phase.
pub(crate) async fn run_phase(
    phase: Phase,
    jobs: Vec<LoadJob>,
    executor: Arc<dyn JobExecutor>,
    workers: usize,
    timeout: Option<Duration>,
    log: Arc<JobLog>,
) -> Result<Vec<JobRecord>, LoadError> {
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut join_set = JoinSet::new();
    let mut outstanding: BTreeSet<String> = BTreeSet::new();

    info!("Phase {}: {} job(s), {} worker(s)", phase, jobs.len(), workers);

    for job in jobs {
        // Waiting here keeps the number of spawned, running jobs at `workers`.
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|e| LoadError::Pipeline {
                phase,
                message: e.to_string(),
            })?;
        outstanding.insert(job.unit.clone());

        let executor = Arc::clone(&executor);
        let log = Arc::clone(&log);
        join_set.spawn(async move {
            let _permit = permit;
            run_job(executor.as_ref(), job, timeout, &log).await
        });
    }

    let mut records = Vec::with_capacity(outstanding.len());
    let mut aborted = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(record) => {
                outstanding.remove(&record.unit);
                records.push(record);
            }
            Err(e) => {
                error!("Phase {} worker task aborted: {}", phase, e);
                aborted.push(e.to_string());
            }
        }
    }

    // Tasks that died without producing a record still count as failed jobs.
    let message = aborted.first().cloned().unwrap_or_default();
    for unit in outstanding {
        let record = JobRecord {
            unit,
            phase,
            started_at: Utc::now(),
            duration: Duration::ZERO,
            outcome: JobOutcome::Failed {
                message: format!("worker task aborted: {message}"),
            },
        };
        log.record(record.clone());
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TableUnit;
    use crate::executor::JobOutput;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SlowExecutor {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl JobExecutor for SlowExecutor {
        async fn check(&self) -> Result<()> {
            Ok(())
        }

        async fn execute(&self, job: &LoadJob) -> Result<JobOutput> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if job.unit == "panics" {
                panic!("executor bug");
            }
            if job.unit == "slow" {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            Ok(JobOutput { rows: Some(1) })
        }
    }

    fn jobs(names: &[&str]) -> Vec<LoadJob> {
        names
            .iter()
            .map(|n| LoadJob::analyze(&TableUnit::new(*n, &[])))
            .collect()
    }

    #[tokio::test]
    async fn test_bound_holds() {
        let executor = Arc::new(SlowExecutor {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let names: Vec<String> = (0..12).map(|i| format!("t{i}")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();

        let records = run_phase(
            Phase::Analyze,
            jobs(&names),
            executor.clone(),
            3,
            None,
            Arc::new(JobLog::new()),
        )
        .await
        .unwrap();

        assert_eq!(records.len(), 12);
        assert!(executor.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_panic_and_timeout_become_failures() {
        let executor = Arc::new(SlowExecutor {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let log = Arc::new(JobLog::new());

        let records = run_phase(
            Phase::Analyze,
            jobs(&["ok", "panics", "slow"]),
            executor,
            2,
            Some(Duration::from_millis(200)),
            Arc::clone(&log),
        )
        .await
        .unwrap();

        assert_eq!(records.len(), 3);
        let failed: BTreeSet<_> = log.failures().into_iter().map(|f| f.unit).collect();
        assert_eq!(
            failed,
            ["panics", "slow"].iter().map(|s| s.to_string()).collect()
        );
        let timeout = log
            .failures()
            .into_iter()
            .find(|f| f.unit == "slow")
            .unwrap();
        assert!(timeout.message.contains("timed out"));
    }

    #[tokio::test]
    async fn test_run_job_outside_the_pool() {
        let executor = SlowExecutor {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };
        let log = JobLog::new();
        let unit = TableUnit::new("slow", &["s_id"]);

        let record = run_job(
            &executor,
            LoadJob::setup(&unit),
            Some(Duration::from_millis(50)),
            &log,
        )
        .await;

        assert_eq!(record.phase, Phase::DropConstraints);
        match &record.outcome {
            JobOutcome::Failed { message } => assert!(message.starts_with("timed out after")),
            other => panic!("expected a failure, got {other:?}"),
        }
        assert_eq!(log.records().len(), 1);
        assert_eq!(log.failures()[0].unit, "slow");

        let quick = TableUnit::new("quick", &[]);
        let ok = run_job(&executor, LoadJob::analyze(&quick), None, &log).await;
        assert_eq!(ok.outcome, JobOutcome::Succeeded { rows: Some(1) });
    }
}
