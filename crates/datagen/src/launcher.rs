//! Generator worker launching.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// One generator worker's assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorJob {
    /// 1-based partition index, unique within a generation step.
    pub partition: u32,
    /// Total partition count.
    pub parallelism: u32,
    pub scale_factor: u32,
    pub destination: PathBuf,
}

/// Exit information from a finished worker.
#[derive(Debug, Clone, Default)]
pub struct WorkerOutput {
    pub success: bool,
    /// Exit code, `None` if the worker was killed by a signal or timed out.
    pub code: Option<i32>,
    pub stderr: String,
}

/// Starts one generator worker and waits for it to exit.
///
/// An `Err` means the worker could not be started; a worker that started and
/// failed is reported through [`WorkerOutput::success`].
#[async_trait]
pub trait WorkerLauncher: Send + Sync {
    async fn launch(&self, job: &GeneratorJob) -> Result<WorkerOutput>;
}

/// Runs the TPC-DS `dsdgen` binary.
#[derive(Debug, Clone)]
pub struct DsdgenLauncher {
    program: PathBuf,
    /// Working directory; dsdgen expects `tpcds.idx` next to it.
    tools_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl DsdgenLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            tools_dir: None,
            timeout: None,
        }
    }

    pub fn with_tools_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tools_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Command-line arguments for a job.
    pub fn args(job: &GeneratorJob) -> Vec<String> {
        let mut args = vec![
            "-SCALE".to_string(),
            job.scale_factor.to_string(),
            "-DIR".to_string(),
            job.destination.display().to_string(),
            "-FORCE".to_string(),
            "Y".to_string(),
            "-QUIET".to_string(),
            "Y".to_string(),
        ];
        if job.parallelism > 1 {
            args.extend([
                "-PARALLEL".to_string(),
                job.parallelism.to_string(),
                "-CHILD".to_string(),
                job.partition.to_string(),
            ]);
        }
        args
    }
}

#[async_trait]
impl WorkerLauncher for DsdgenLauncher {
    async fn launch(&self, job: &GeneratorJob) -> Result<WorkerOutput> {
        let mut command = Command::new(&self.program);
        command
            .args(Self::args(job))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.tools_dir {
            command.current_dir(dir);
        }

        debug!(
            "Starting {} for partition {}/{}",
            self.program.display(),
            job.partition,
            job.parallelism
        );
        let child = command
            .spawn()
            .with_context(|| format!("Failed to start {}", self.program.display()))?;

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output?,
                Err(_) => {
                    return Ok(WorkerOutput {
                        success: false,
                        code: None,
                        stderr: format!("timed out after {}s", limit.as_secs()),
                    })
                }
            },
            None => child.wait_with_output().await?,
        };

        Ok(WorkerOutput {
            success: output.status.success(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
