//! Error types for data generation.

use bench_config::ConfigError;
use thiserror::Error;

/// Errors that abort a generation step.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// Rejected before any worker was launched.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Destination or another required setting is unavailable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The destination directory could not be prepared.
    #[error("Failed to prepare destination {path}: {source}")]
    Destination {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A worker could not be started at all.
    #[error("Failed to launch generator worker {partition}: {message}")]
    Launch { partition: u32, message: String },

    /// One or more workers exited unsuccessfully. Partial output is left in place.
    #[error("{failed} of {total} generator workers failed; first failure (worker {partition}, exit {code}): {stderr}")]
    WorkerFailed {
        failed: usize,
        total: u32,
        partition: u32,
        code: String,
        stderr: String,
    },
}
