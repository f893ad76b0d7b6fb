//! Workload Executor
//!
//! Runs the 99 TPC-DS workloads in id order against a loaded database, or
//! captures their plans. Each workload may hold several statements; they run
//! sequentially and the first failing statement ends the workload with
//! status `ERROR`. Absent workloads are `SKIPPED`.
//!
//! Per-workload output goes to an artifact file, every run writes a
//! `summary.csv`, and EXECUTE runs are also recorded in a [`ResultsStore`].

mod error;
mod executor;
mod record;
mod runner;
mod split;
mod store;
mod suite;

pub use error::RunError;
pub use executor::{
    RunMode, RunOptions, RunSummary, WorkloadExecutor, WorkloadOutput, DEFAULT_EXPLAIN_OPTIONS,
};
pub use record::{write_summary_csv, SummaryRow, WorkloadRecord, WorkloadStatus};
pub use runner::{PostgresRunner, StatementOutput, StatementRunner};
pub use split::split_statements;
pub use store::{MemoryResultsStore, NullResultsStore, PostgresResultsStore, ResultsStore, StoredResult};
pub use suite::{workload_ids, DirectorySource, WorkloadSource, SUITE_SIZE};
