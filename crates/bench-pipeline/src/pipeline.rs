//! Benchmark pipeline orchestration.

use bench_runner::WorkloadExecutor;
use bulk_load::BulkLoader;
use datagen::Generator;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::error::BenchError;
use crate::report::{PipelineReport, StageTiming};

/// Runs generate, load and run in sequence.
pub struct PipelineDriver {
    generator: Generator,
    loader: BulkLoader,
    executor: WorkloadExecutor,
}

impl PipelineDriver {
    pub fn new(generator: Generator, loader: BulkLoader, executor: WorkloadExecutor) -> Self {
        Self {
            generator,
            loader,
            executor,
        }
    }

    /// Run every enabled stage.
    ///
    /// A failing stage stops the pipeline. The returned report then has the
    /// `Error` status and the error message, and keeps the results of the
    /// stages that finished before it. Failed tables and workloads are
    /// reported without stopping; failed tables stop the pipeline only when
    /// `fail_on_load_errors` is set.
    pub async fn run(&self, config: PipelineConfig) -> Result<PipelineReport, BenchError> {
        let start = Instant::now();
        let mut report = PipelineReport::new();
        info!("Starting benchmark pipeline: {}", config.stages().join(" -> "));

        if let Some(request) = config.generate {
            let stage_start = Instant::now();
            let result = self.generator.generate(request).await;
            report.stages.push(StageTiming {
                stage: "generate",
                duration: stage_start.elapsed(),
            });
            match result {
                Ok(outcome) => report.generation = Some(outcome),
                Err(e) => return Ok(abort(report, start, e.into())),
            }
        }

        if let Some(mut options) = config.load {
            // Load exactly what was just generated.
            if let Some(generation) = &report.generation {
                options.destination.get_or_insert_with(|| generation.destination.clone());
                options.parallelism.get_or_insert(generation.parallelism);
            }
            let stage_start = Instant::now();
            let result = self.loader.load(options).await;
            report.stages.push(StageTiming {
                stage: "load",
                duration: stage_start.elapsed(),
            });
            let load = match result {
                Ok(load) => load,
                Err(e) => return Ok(abort(report, start, e.into())),
            };

            let failed = load.failed.to_vec();
            report.load = Some(load);
            if !failed.is_empty() {
                warn!("Load finished with failed tables: {}", failed.join(", "));
                if config.fail_on_load_errors {
                    return Ok(abort(report, start, BenchError::LoadIncomplete(failed)));
                }
            }
        }

        if let Some(options) = config.run {
            let stage_start = Instant::now();
            let result = self.executor.run(options).await;
            report.stages.push(StageTiming {
                stage: "run",
                duration: stage_start.elapsed(),
            });
            match result {
                Ok(run) => report.run = Some(run),
                Err(e) => return Ok(abort(report, start, e.into())),
            }
        }

        report.finish(start.elapsed());
        info!(
            "Benchmark pipeline finished in {:.1}s ({:?})",
            report.total_duration.as_secs_f64(),
            report.status
        );
        Ok(report)
    }
}

fn abort(mut report: PipelineReport, start: Instant, err: BenchError) -> PipelineReport {
    error!("{}", err);
    report.abort(err.to_string(), start.elapsed());
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::PipelineStatus;
    use anyhow::Result;
    use async_trait::async_trait;
    use bench_config::{keys, ConfigProvider, MemoryConfigStore};
    use bench_runner::{
        MemoryResultsStore, ResultsStore, RunMode, RunOptions, StatementOutput, StatementRunner,
        WorkloadStatus,
    };
    use bulk_load::{tpcds_tables, JobExecutor, JobOutput, LoadJob, LoadOptions, Phase};
    use datagen::{GenerateRequest, GeneratorJob, WorkerLauncher, WorkerOutput};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Writes one small file per table for its partition.
    #[derive(Default)]
    struct FileWritingLauncher {
        launches: AtomicUsize,
    }

    #[async_trait]
    impl WorkerLauncher for FileWritingLauncher {
        async fn launch(&self, job: &GeneratorJob) -> Result<WorkerOutput> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            for unit in tpcds_tables() {
                let name = if job.parallelism == 1 {
                    format!("{}.dat", unit.name)
                } else {
                    format!("{}_{}_{}.dat", unit.name, job.partition, job.parallelism)
                };
                tokio::fs::write(job.destination.join(name), "1|x|\n").await?;
            }
            Ok(WorkerOutput {
                success: true,
                code: Some(0),
                stderr: String::new(),
            })
        }
    }

    #[derive(Default)]
    struct FakeJobExecutor {
        fail_copy_of: Option<String>,
    }

    #[async_trait]
    impl JobExecutor for FakeJobExecutor {
        async fn check(&self) -> Result<()> {
            Ok(())
        }

        async fn execute(&self, job: &LoadJob) -> Result<JobOutput> {
            if job.phase == Phase::Copy && self.fail_copy_of.as_deref() == Some(job.unit.as_str()) {
                anyhow::bail!("ERROR: extra data after last expected column");
            }
            Ok(JobOutput { rows: Some(1) })
        }
    }

    struct OkRunner;

    #[async_trait]
    impl StatementRunner for OkRunner {
        async fn execute(&self, _sql: &str) -> Result<StatementOutput> {
            Ok(StatementOutput {
                rows: 1,
                text: "1\n".to_string(),
            })
        }

        async fn explain(&self, _sql: &str, _options: &str) -> Result<String> {
            Ok("Result".to_string())
        }
    }

    struct Fixture {
        _dir: TempDir,
        launcher: Arc<FileWritingLauncher>,
        store: Arc<MemoryResultsStore>,
        config: Arc<MemoryConfigStore>,
        driver: PipelineDriver,
    }

    fn fixture(executor: FakeJobExecutor) -> Fixture {
        let dir = TempDir::new().unwrap();
        let config = Arc::new(MemoryConfigStore::with_values([
            (keys::DATA_DIR, dir.path().join("data").display().to_string()),
            (keys::RESULTS_DIR, dir.path().join("results").display().to_string()),
        ]));
        let launcher = Arc::new(FileWritingLauncher::default());
        let store = Arc::new(MemoryResultsStore::new());
        let workloads: BTreeMap<u32, String> =
            (1..=3).map(|id| (id, format!("select {id};"))).collect();

        let generator = Generator::new(launcher.clone(), config.clone());
        let loader = BulkLoader::new(Arc::new(executor), config.clone());
        let executor = WorkloadExecutor::new(
            Arc::new(OkRunner),
            Arc::new(workloads),
            store.clone(),
            config.clone(),
        );

        Fixture {
            _dir: dir,
            launcher,
            store,
            config,
            driver: PipelineDriver::new(generator, loader, executor),
        }
    }

    fn full_config(parallelism: u32) -> PipelineConfig {
        PipelineConfig {
            generate: Some(GenerateRequest {
                scale_factor: 1,
                parallelism,
                destination: None,
            }),
            load: Some(LoadOptions {
                workers: Some(4),
                ..Default::default()
            }),
            run: Some(RunOptions::new(RunMode::Execute)),
            fail_on_load_errors: false,
        }
    }

    #[tokio::test]
    async fn test_full_pipeline_passes() {
        let fixture = fixture(FakeJobExecutor::default());
        let report = fixture.driver.run(full_config(2)).await.unwrap();

        assert_eq!(report.status, PipelineStatus::Passed);
        assert_eq!(fixture.launcher.launches.load(Ordering::SeqCst), 2);

        let load = report.load.as_ref().unwrap();
        assert_eq!(load.parallelism, 2);
        assert_eq!(load.units.len(), 25);

        let run = report.run.as_ref().unwrap();
        assert_eq!(run.ok, 3);
        assert_eq!(run.skipped, 96);
        assert_eq!(fixture.store.latest().await.unwrap().len(), 99);

        let stages: Vec<_> = report.stages.iter().map(|s| s.stage).collect();
        assert_eq!(stages, vec!["generate", "load", "run"]);
        assert!(report.summary().starts_with("Benchmark Report: PASSED"));
        assert_eq!(
            fixture.config.get(keys::SCALE_FACTOR).await.unwrap().as_deref(),
            Some("1")
        );
    }

    #[tokio::test]
    async fn test_invalid_generation_stops_pipeline() {
        let fixture = fixture(FakeJobExecutor::default());
        let report = fixture.driver.run(full_config(0)).await.unwrap();

        assert_eq!(report.status, PipelineStatus::Error);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("Generation failed:"));
        assert!(report.load.is_none());
        assert!(report.run.is_none());
        assert_eq!(fixture.launcher.launches.load(Ordering::SeqCst), 0);
        assert!(fixture.store.history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_table_still_runs_workloads() {
        let fixture = fixture(FakeJobExecutor {
            fail_copy_of: Some("store_sales".to_string()),
        });
        let report = fixture.driver.run(full_config(1)).await.unwrap();

        assert_eq!(report.status, PipelineStatus::Failed);
        assert!(report.load.as_ref().unwrap().failed.contains("store_sales"));
        let run = report.run.as_ref().unwrap();
        assert!(run
            .records
            .iter()
            .filter(|r| r.id <= 3)
            .all(|r| r.status == WorkloadStatus::Ok));
    }

    #[tokio::test]
    async fn test_fail_on_load_errors() {
        let fixture = fixture(FakeJobExecutor {
            fail_copy_of: Some("item".to_string()),
        });
        let mut config = full_config(1);
        config.fail_on_load_errors = true;

        let report = fixture.driver.run(config).await.unwrap();
        assert_eq!(report.status, PipelineStatus::Error);
        assert_eq!(
            report.errors,
            vec!["Load incomplete, failed tables: item".to_string()]
        );
        assert!(report.load.as_ref().unwrap().failed.contains("item"));
        assert!(report.run.is_none());
        assert!(fixture.store.history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_keeps_generation_results() {
        let fixture = fixture(FakeJobExecutor::default());
        let mut config = full_config(2);
        // Files were written with two partitions; asking for three finds none.
        config.load = Some(LoadOptions {
            workers: Some(4),
            parallelism: Some(3),
            ..Default::default()
        });

        let report = fixture.driver.run(config).await.unwrap();
        assert!(!report.passed());
        assert_eq!(report.status, PipelineStatus::Error);
        assert_eq!(report.generation.as_ref().unwrap().parallelism, 2);
        let stages: Vec<_> = report.stages.iter().map(|s| s.stage).collect();
        assert_eq!(stages, vec!["generate", "load"]);
        assert!(report.errors[0].starts_with("Load failed:"));
        assert!(report.run.is_none());

        let summary = report.summary();
        assert!(summary.starts_with("Benchmark Report: ERROR"));
        assert!(summary.contains("Generate: scale factor 1, 2 partition(s)"));
        assert!(summary.contains("\nErrors:\n- Load failed:"));
    }

    #[tokio::test]
    async fn test_run_only() {
        let fixture = fixture(FakeJobExecutor::default());
        let config = PipelineConfig {
            generate: None,
            load: None,
            run: Some(RunOptions::new(RunMode::explain_default())),
            fail_on_load_errors: false,
        };
        let report = fixture.driver.run(config).await.unwrap();

        assert!(report.passed());
        assert!(report.generation.is_none());
        assert!(report.load.is_none());
        assert_eq!(fixture.launcher.launches.load(Ordering::SeqCst), 0);
        // EXPLAIN runs leave the store alone.
        assert!(fixture.store.history().await.unwrap().is_empty());
    }
}
