//! Collection of identifiers that failed during a run.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

/// Identifiers (table units or workloads) that failed in the current run.
///
/// Cloning is cheap and every clone refers to the same set, so concurrent
/// workers can record failures while the coordinator keeps reading it.
/// A failure recorded here never stops sibling processing.
#[derive(Debug, Clone, Default)]
pub struct ErrorSet {
    inner: Arc<Mutex<BTreeSet<String>>>,
}

impl ErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed identifier. Returns `false` if it was already present.
    pub fn insert(&self, id: impl Into<String>) -> bool {
        self.lock().insert(id.into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sorted copy of the current members.
    pub fn to_vec(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
