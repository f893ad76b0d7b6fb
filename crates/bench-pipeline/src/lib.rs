//! Pipeline Driver
//!
//! Composes the Generation Coordinator, the Bulk Load Orchestrator and the
//! Workload Executor into one benchmark run with a single aggregate report.

mod config;
mod error;
mod pipeline;
mod report;

pub use config::PipelineConfig;
pub use error::BenchError;
pub use pipeline::PipelineDriver;
pub use report::{PipelineReport, PipelineStatus, StageTiming};
