//! Error types for configuration access.

use thiserror::Error;

/// Errors raised while reading settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required setting has no value in the store and was not given on the command line.
    #[error("Configuration error: required setting '{key}' is not set")]
    Missing { key: String },

    /// A setting exists but cannot be parsed.
    #[error("Configuration error: setting '{key}' has invalid value '{value}': {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    /// The backing store itself failed.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
