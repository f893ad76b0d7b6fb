//! Partitioned generation.

use bench_config::{keys, settings, ConfigProvider};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::error::GenerateError;
use crate::launcher::{GeneratorJob, WorkerLauncher, WorkerOutput};

/// Parameters for one generation step.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub scale_factor: u32,
    pub parallelism: u32,
    /// Overrides the stored `data_dir`.
    pub destination: Option<PathBuf>,
}

/// What a successful generation produced.
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub scale_factor: u32,
    pub parallelism: u32,
    pub destination: PathBuf,
    pub duration: Duration,
}

/// Generation Coordinator.
pub struct Generator {
    launcher: Arc<dyn WorkerLauncher>,
    config: Arc<dyn ConfigProvider>,
}

impl Generator {
    pub fn new(launcher: Arc<dyn WorkerLauncher>, config: Arc<dyn ConfigProvider>) -> Self {
        Self { launcher, config }
    }

    /// Run every partition concurrently and wait for all of them.
    ///
    /// Existing files in the destination are overwritten. On success the
    /// scale factor, parallelism and absolute destination are persisted for
    /// the load step.
    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerateOutcome, GenerateError> {
        if request.parallelism < 1 {
            return Err(GenerateError::InvalidArgument(format!(
                "parallelism must be at least 1, got {}",
                request.parallelism
            )));
        }
        if request.scale_factor < 1 {
            return Err(GenerateError::InvalidArgument(format!(
                "scale factor must be at least 1, got {}",
                request.scale_factor
            )));
        }

        let destination = settings::resolve_dir(
            self.config.as_ref(),
            keys::DATA_DIR,
            request.destination.as_ref(),
        )
        .await?;
        // Workers may run from another directory, so they only ever see an
        // absolute path.
        let destination =
            std::path::absolute(&destination).map_err(|source| GenerateError::Destination {
                path: destination.display().to_string(),
                source,
            })?;
        tokio::fs::create_dir_all(&destination)
            .await
            .map_err(|source| GenerateError::Destination {
                path: destination.display().to_string(),
                source,
            })?;

        info!(
            "Generating scale factor {} into {} with {} worker(s)",
            request.scale_factor,
            destination.display(),
            request.parallelism
        );
        let start = Instant::now();

        let mut workers = JoinSet::new();
        for partition in 1..=request.parallelism {
            let launcher = Arc::clone(&self.launcher);
            let job = GeneratorJob {
                partition,
                parallelism: request.parallelism,
                scale_factor: request.scale_factor,
                destination: destination.clone(),
            };
            workers.spawn(async move {
                let result = launcher.launch(&job).await;
                (job.partition, result)
            });
        }

        let mut failures: Vec<(u32, WorkerOutput)> = Vec::new();
        let mut launch_error: Option<(u32, String)> = None;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((partition, Ok(output))) if output.success => {
                    info!("Generator worker {} finished", partition);
                }
                Ok((partition, Ok(output))) => {
                    error!(
                        "Generator worker {} failed (exit {:?}): {}",
                        partition, output.code, output.stderr
                    );
                    failures.push((partition, output));
                }
                Ok((partition, Err(e))) => {
                    error!("Generator worker {} could not start: {:#}", partition, e);
                    launch_error.get_or_insert((partition, format!("{e:#}")));
                }
                Err(e) => {
                    error!("Generator worker task panicked: {}", e);
                    launch_error.get_or_insert((0, e.to_string()));
                }
            }
        }

        if let Some((partition, message)) = launch_error {
            return Err(GenerateError::Launch { partition, message });
        }
        if !failures.is_empty() {
            failures.sort_by_key(|(partition, _)| *partition);
            let (partition, first) = &failures[0];
            return Err(GenerateError::WorkerFailed {
                failed: failures.len(),
                total: request.parallelism,
                partition: *partition,
                code: first
                    .code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none".to_string()),
                stderr: first.stderr.clone(),
            });
        }

        self.config
            .set(keys::SCALE_FACTOR, &request.scale_factor.to_string())
            .await
            .map_err(bench_config::ConfigError::from)?;
        self.config
            .set(keys::PARALLEL, &request.parallelism.to_string())
            .await
            .map_err(bench_config::ConfigError::from)?;
        self.config
            .set(keys::DATA_DIR, &destination.display().to_string())
            .await
            .map_err(bench_config::ConfigError::from)?;

        let duration = start.elapsed();
        info!(
            "Generation finished in {:.1}s",
            duration.as_secs_f64()
        );

        Ok(GenerateOutcome {
            scale_factor: request.scale_factor,
            parallelism: request.parallelism,
            destination,
            duration,
        })
    }
}
