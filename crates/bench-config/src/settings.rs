//! Typed access to configuration values.

use crate::{ConfigError, ConfigProvider};
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

/// Read and parse an optional setting.
pub async fn get_parsed<T>(provider: &dyn ConfigProvider, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match provider.get(key).await? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                key: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}

/// Read and parse a setting that must be present.
pub async fn require<T>(provider: &dyn ConfigProvider, key: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    get_parsed(provider, key)
        .await?
        .ok_or_else(|| ConfigError::Missing {
            key: key.to_string(),
        })
}

/// Resolve a directory: an explicit override wins, otherwise the stored value.
pub async fn resolve_dir(
    provider: &dyn ConfigProvider,
    key: &str,
    explicit: Option<&PathBuf>,
) -> Result<PathBuf, ConfigError> {
    match explicit {
        Some(path) => Ok(path.clone()),
        None => require::<PathBuf>(provider, key).await,
    }
}

/// Store an explicitly given value so later commands can omit it.
pub async fn remember<T: Display>(
    provider: &dyn ConfigProvider,
    key: &str,
    value: Option<T>,
) -> Result<(), ConfigError> {
    if let Some(value) = value {
        provider.set(key, &value.to_string()).await?;
    }
    Ok(())
}

/// Store an explicitly given directory as an absolute path.
pub async fn remember_dir(
    provider: &dyn ConfigProvider,
    key: &str,
    dir: Option<&PathBuf>,
) -> Result<(), ConfigError> {
    let Some(dir) = dir else {
        return Ok(());
    };
    let absolute = std::path::absolute(dir).map_err(|e| ConfigError::Invalid {
        key: key.to_string(),
        value: dir.display().to_string(),
        reason: e.to_string(),
    })?;
    remember(provider, key, Some(absolute.display())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{keys, MemoryConfigStore};

    #[tokio::test]
    async fn test_get_parsed_missing_is_none() {
        let store = MemoryConfigStore::new();
        let sf: Option<u32> = get_parsed(&store, keys::SCALE_FACTOR).await.unwrap();
        assert!(sf.is_none());
    }

    #[tokio::test]
    async fn test_get_parsed_invalid_value() {
        let store = MemoryConfigStore::new();
        store.set(keys::PARALLEL, "four").await.unwrap();
        let err = get_parsed::<u32>(&store, keys::PARALLEL).await.unwrap_err();
        match err {
            ConfigError::Invalid { key, value, .. } => {
                assert_eq!(key, "parallel");
                assert_eq!(value, "four");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_require_reports_key() {
        let store = MemoryConfigStore::new();
        let err = require::<PathBuf>(&store, keys::DATA_DIR).await.unwrap_err();
        assert!(matches!(err, ConfigError::Missing { ref key } if key == "data_dir"));
        assert!(err.to_string().contains("data_dir"));
    }

    #[tokio::test]
    async fn test_resolve_dir_prefers_explicit() {
        let store = MemoryConfigStore::new();
        store.set(keys::DATA_DIR, "/stored").await.unwrap();

        let explicit = PathBuf::from("/explicit");
        let dir = resolve_dir(&store, keys::DATA_DIR, Some(&explicit))
            .await
            .unwrap();
        assert_eq!(dir, explicit);

        let dir = resolve_dir(&store, keys::DATA_DIR, None).await.unwrap();
        assert_eq!(dir, PathBuf::from("/stored"));
    }

    #[tokio::test]
    async fn test_remember_only_explicit_values() {
        let store = MemoryConfigStore::new();
        store.set(keys::LOAD_WORKERS, "2").await.unwrap();

        remember::<usize>(&store, keys::LOAD_WORKERS, None).await.unwrap();
        assert_eq!(store.get(keys::LOAD_WORKERS).await.unwrap().as_deref(), Some("2"));

        remember(&store, keys::LOAD_WORKERS, Some(8)).await.unwrap();
        let workers: Option<usize> = get_parsed(&store, keys::LOAD_WORKERS).await.unwrap();
        assert_eq!(workers, Some(8));
    }

    #[tokio::test]
    async fn test_remember_dir_stores_absolute_path() {
        let store = MemoryConfigStore::new();
        let relative = PathBuf::from("queries");

        remember_dir(&store, keys::QUERY_DIR, Some(&relative)).await.unwrap();

        let stored = resolve_dir(&store, keys::QUERY_DIR, None).await.unwrap();
        assert!(stored.is_absolute());
        assert_eq!(stored, std::env::current_dir().unwrap().join("queries"));
    }
}
