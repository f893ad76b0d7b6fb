//! Error types for the pipeline.

use bench_config::ConfigError;
use bench_runner::RunError;
use bulk_load::LoadError;
use datagen::GenerateError;
use thiserror::Error;

/// Errors that stop a benchmark pipeline.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Generation failed: {0}")]
    Generate(#[from] GenerateError),

    #[error("Load failed: {0}")]
    Load(#[from] LoadError),

    /// The load finished but some tables failed and the pipeline was told
    /// not to run workloads against partial data.
    #[error("Load incomplete, failed tables: {}", .0.join(", "))]
    LoadIncomplete(Vec<String>),

    #[error("Workload run failed: {0}")]
    Run(#[from] RunError),
}
