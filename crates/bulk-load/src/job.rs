//! Typed load jobs.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::catalog::TableUnit;

/// Load phases in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    DropConstraints,
    Copy,
    RebuildConstraints,
    Analyze,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::DropConstraints,
        Phase::Copy,
        Phase::RebuildConstraints,
        Phase::Analyze,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::DropConstraints => "drop-constraints",
            Phase::Copy => "copy",
            Phase::RebuildConstraints => "rebuild-constraints",
            Phase::Analyze => "analyze",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a job does to its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOperation {
    /// Empty the table and drop its primary-key constraint if it has one.
    TruncateAndDropKey { constraint: Option<String> },
    /// Stream the given files, in order, into the table.
    Copy { sources: Vec<PathBuf>, delimiter: u8 },
    /// Re-create the primary key.
    RebuildKey {
        constraint: String,
        columns: Vec<String>,
        maintenance_workers: u32,
    },
    /// Refresh statistics and report the estimated row count.
    Analyze,
}

/// A unit of work for one table in one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadJob {
    pub unit: String,
    pub phase: Phase,
    pub operation: JobOperation,
}

impl LoadJob {
    pub fn setup(unit: &TableUnit) -> Self {
        Self {
            unit: unit.name.clone(),
            phase: Phase::DropConstraints,
            operation: JobOperation::TruncateAndDropKey {
                constraint: unit.constraint_name(),
            },
        }
    }

    pub fn copy(unit: &TableUnit, sources: Vec<PathBuf>, delimiter: u8) -> Self {
        Self {
            unit: unit.name.clone(),
            phase: Phase::Copy,
            operation: JobOperation::Copy { sources, delimiter },
        }
    }

    /// `None` for tables without a primary key.
    pub fn rebuild(unit: &TableUnit, maintenance_workers: u32) -> Option<Self> {
        let constraint = unit.constraint_name()?;
        Some(Self {
            unit: unit.name.clone(),
            phase: Phase::RebuildConstraints,
            operation: JobOperation::RebuildKey {
                constraint,
                columns: unit.primary_key.clone(),
                maintenance_workers,
            },
        })
    }

    pub fn analyze(unit: &TableUnit) -> Self {
        Self {
            unit: unit.name.clone(),
            phase: Phase::Analyze,
            operation: JobOperation::Analyze,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        let mut phases = Phase::ALL.to_vec();
        phases.reverse();
        phases.sort();
        assert_eq!(phases, Phase::ALL.to_vec());
    }

    #[test]
    fn test_rebuild_skips_keyless_table() {
        let unit = TableUnit::new("dbgen_version", &[]);
        assert!(LoadJob::rebuild(&unit, 4).is_none());

        let unit = TableUnit::new("item", &["i_item_sk"]);
        let job = LoadJob::rebuild(&unit, 4).unwrap();
        assert_eq!(
            job.operation,
            JobOperation::RebuildKey {
                constraint: "item_pkey".to_string(),
                columns: vec!["i_item_sk".to_string()],
                maintenance_workers: 4,
            }
        );
    }
}
