//! Configuration storage for tpcds-bench
//!
//! The harness never owns its settings: destination directories, the
//! persisted scale factor and the persisted parallelism all live in a
//! key-value store reached through the [`ConfigProvider`] trait. Each stage
//! receives a provider at construction time.
//!
//! ## Storage Backends
//!
//! - [`FileConfigStore`] - JSON object in a local file
//! - [`MemoryConfigStore`] - process-local map, for tests and one-shot runs
//! - [`PostgresConfigStore`] - `<schema>.config(key, value)` table
//!
//! Typed access goes through the helpers in [`settings`], which turn missing
//! or malformed values into [`ConfigError`].

mod error;
mod file;
mod memory;
mod postgres;
pub mod settings;
mod store;

pub use error::ConfigError;
pub use file::FileConfigStore;
pub use memory::MemoryConfigStore;
pub use postgres::PostgresConfigStore;
pub use store::{keys, ConfigProvider};
