//! Generation Coordinator
//!
//! Drives `parallelism` external generator workers, each writing one
//! disjoint partition of every table into a shared destination directory.
//! The generator itself is opaque; workers are started through the
//! [`WorkerLauncher`] seam so tests can substitute a fake.

mod coordinator;
mod error;
mod launcher;

pub use coordinator::{GenerateOutcome, GenerateRequest, Generator};
pub use error::GenerateError;
pub use launcher::{DsdgenLauncher, GeneratorJob, WorkerLauncher, WorkerOutput};
