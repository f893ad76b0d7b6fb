//! Command handlers.

pub mod generate;
pub mod load;
pub mod pipeline;
pub mod report;
pub mod run;
pub mod tune;

use anyhow::Context;
use std::time::Duration;

/// Parse an optional duration flag such as `300`, `30m` or `1h`.
pub(crate) fn parse_timeout(value: Option<&str>, flag: &str) -> anyhow::Result<Option<Duration>> {
    value
        .map(|v| {
            bench_core::parse_duration(v).with_context(|| format!("Invalid --{flag} value: {v}"))
        })
        .transpose()
}
