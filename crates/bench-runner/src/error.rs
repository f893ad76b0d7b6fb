//! Error types for workload runs.

use bench_config::ConfigError;
use thiserror::Error;

/// Errors that stop a run. Failing statements are recorded, not raised.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Workload {0} not found")]
    WorkloadNotFound(u32),

    #[error("Failed to read workload {id}: {message}")]
    Source { id: u32, message: String },

    #[error("Results store error: {0:#}")]
    Store(anyhow::Error),

    #[error("Failed to write {path}: {source}")]
    Artifact {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
