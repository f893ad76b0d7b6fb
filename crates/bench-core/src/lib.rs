//! Core types for tpcds-bench.
//!
//! This crate holds the small pieces every stage of the harness shares:
//!
//! - [`ErrorSet`] - identifiers of units or workloads that failed in a run
//! - [`parse_duration`] - "30m" / "1h" / "300" style duration strings
//! - [`format_duration`] / [`format_number`] - human-readable report values

mod duration;
mod error_set;
mod format;

pub use duration::parse_duration;
pub use error_set::ErrorSet;
pub use format::{format_duration, format_millis, format_number};
