//! tpcds-bench Library
//!
//! Command handlers and shared CLI option types for the `tpcds-bench` binary.
//! The benchmark stages themselves live in the workspace crates:
//!
//! - `datagen` - Generation Coordinator (parallel `dsdgen` workers)
//! - `bulk-load` - Bulk Load Orchestrator (truncate, copy, rebuild keys, analyze)
//! - `bench-runner` - Workload Executor (execute or explain the 99 workloads)
//! - `bench-pipeline` - Pipeline Driver (generate, load and run in one go)
//! - `bench-report` - run reports, console tables and server tuning
//!
//! # CLI Usage
//!
//! ```bash
//! # Generate scale factor 10 with 8 workers, then load it
//! tpcds-bench generate --scale-factor 10 --parallel 8 --data-dir /data/tpcds
//! tpcds-bench load --workers 8
//!
//! # Execute the suite and write a report
//! tpcds-bench run --query-dir ./queries
//! tpcds-bench report --output-dir ./results
//!
//! # Everything at once
//! tpcds-bench pipeline --scale-factor 1 --parallel 4
//! ```

pub mod commands;
mod store;

pub use store::{open_config_store, ConfigStoreKind, StoreOpts};
