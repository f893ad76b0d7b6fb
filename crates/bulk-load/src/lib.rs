//! Bulk Load Orchestrator
//!
//! Loads generated `.dat` files into PostgreSQL in four globally ordered
//! phases separated by full barriers:
//!
//! 1. **Setup** (sequential): truncate every table and drop its primary key
//! 2. **Copy** (at most `W` concurrent jobs): stream each table's files
//! 3. **Rebuild** (at most `W`): re-add primary keys with a parallel sort build
//! 4. **Analyze** (at most `W`): refresh planner statistics
//!
//! A failing job marks only its own table as failed; siblings continue and
//! dependent phases are still attempted for the failed table. Setup failures,
//! missing sources and an unreachable database abort the load.
//!
//! Jobs are typed descriptors ([`LoadJob`]) executed by a [`JobExecutor`];
//! [`PostgresJobExecutor`] is the production implementation.

pub mod catalog;
mod error;
mod executor;
mod job;
mod log;
mod orchestrator;
mod pool;
pub mod source;
mod state;
mod stream;

pub use catalog::{tpcds_tables, TableUnit};
pub use error::LoadError;
pub use executor::{JobExecutor, JobOutput, PostgresJobExecutor};
pub use job::{JobOperation, LoadJob, Phase};
pub use log::{JobLog, JobOutcome, JobRecord, UnitFailure};
pub use orchestrator::{BulkLoader, LoadOptions, LoadReport, UnitSummary};
pub use state::UnitState;
pub use stream::RecordReader;
