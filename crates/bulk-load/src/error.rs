//! Error types for the bulk loader.

use bench_config::ConfigError;
use thiserror::Error;

use crate::job::Phase;

/// Errors that stop a load. Per-table failures are recorded, not raised.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing or ambiguous generated files. No table was touched.
    #[error("Source not found: {0}")]
    SourceNotFound(String),

    /// Setup or phase infrastructure failed; remaining phases were not run.
    #[error("Load aborted during {phase}: {message}")]
    Pipeline { phase: Phase, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
