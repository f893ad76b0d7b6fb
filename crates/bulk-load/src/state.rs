//! Per-table load state.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::job::Phase;

/// Lifecycle of one table through a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitState {
    Pending,
    Copied,
    Keyed,
    Analyzed,
    /// Terminal. Records the first phase that failed.
    Failed(Phase),
}

impl UnitState {
    pub fn is_failed(&self) -> bool {
        matches!(self, UnitState::Failed(_))
    }
}

/// State plus the phases already attempted for a table.
#[derive(Debug, Clone)]
pub(crate) struct UnitProgress {
    state: UnitState,
    attempted: BTreeSet<Phase>,
}

impl Default for UnitProgress {
    fn default() -> Self {
        Self {
            state: UnitState::Pending,
            attempted: BTreeSet::new(),
        }
    }
}

impl UnitProgress {
    pub fn state(&self) -> UnitState {
        self.state
    }

    pub fn attempted(&self, phase: Phase) -> bool {
        self.attempted.contains(&phase)
    }

    /// Apply the result of a job in `phase`.
    ///
    /// A failed unit stays failed; later phases are still tracked as attempted.
    pub fn finish(&mut self, phase: Phase, succeeded: bool) {
        self.attempted.insert(phase);
        if self.state.is_failed() {
            return;
        }
        if !succeeded {
            self.state = UnitState::Failed(phase);
            return;
        }
        self.state = match (phase, self.state) {
            (Phase::DropConstraints, state) => state,
            (Phase::Copy, UnitState::Pending) => UnitState::Copied,
            (Phase::RebuildConstraints, UnitState::Copied) if self.attempted(Phase::Copy) => {
                UnitState::Keyed
            }
            (Phase::Analyze, UnitState::Keyed) => UnitState::Analyzed,
            (_, state) => state,
        };
    }

    /// Reach KEYED without a job, for tables with no primary key.
    pub fn skip_rebuild(&mut self) {
        self.finish(Phase::RebuildConstraints, true);
    }
}
