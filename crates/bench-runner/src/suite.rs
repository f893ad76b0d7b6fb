//! The workload suite and where its text comes from.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Number of workloads in the suite.
pub const SUITE_SIZE: u32 = 99;

/// Workload ids in execution order.
pub fn workload_ids() -> RangeInclusive<u32> {
    1..=SUITE_SIZE
}

/// Supplies prepared workload text.
#[async_trait]
pub trait WorkloadSource: Send + Sync {
    /// `None` if the workload was not prepared.
    async fn load(&self, id: u32) -> Result<Option<String>>;
}

/// Reads `query<id>.sql` files from a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, id: u32) -> PathBuf {
        self.dir.join(format!("query{id}.sql"))
    }
}

#[async_trait]
impl WorkloadSource for DirectorySource {
    async fn load(&self, id: u32) -> Result<Option<String>> {
        let path = self.path_for(id);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }
}

#[async_trait]
impl WorkloadSource for BTreeMap<u32, String> {
    async fn load(&self, id: u32) -> Result<Option<String>> {
        Ok(self.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_suite_order() {
        let ids: Vec<u32> = workload_ids().collect();
        assert_eq!(ids.len(), 99);
        assert_eq!(ids.first(), Some(&1));
        assert_eq!(ids.last(), Some(&99));
    }

    #[tokio::test]
    async fn test_directory_source() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("query7.sql"), "select 7;").unwrap();
        let source = DirectorySource::new(temp_dir.path());

        assert_eq!(source.load(7).await.unwrap().as_deref(), Some("select 7;"));
        assert_eq!(source.load(8).await.unwrap(), None);
    }
}
