//! Configuration provider trait and well-known keys.

use anyhow::Result;
use async_trait::async_trait;

/// Keys the harness reads and writes.
pub mod keys {
    /// Scale factor of the most recent generation.
    pub const SCALE_FACTOR: &str = "scale_factor";
    /// Partition count of the most recent generation.
    pub const PARALLEL: &str = "parallel";
    /// Directory the generator writes `.dat` files into.
    pub const DATA_DIR: &str = "data_dir";
    /// Directory holding the prepared `query<N>.sql` workloads.
    pub const QUERY_DIR: &str = "query_dir";
    /// Directory per-workload artifacts are written to.
    pub const RESULTS_DIR: &str = "results_dir";
    /// Default worker bound for the bulk load.
    pub const LOAD_WORKERS: &str = "load_workers";
}

/// Narrow get/set interface onto an external key-value configuration store.
///
/// Implementations must be safe to share across tasks; the orchestrators
/// hold them behind an `Arc<dyn ConfigProvider>`.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Read a value. Returns `None` if the key was never set.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}
