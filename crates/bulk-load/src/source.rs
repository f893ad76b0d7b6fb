//! Resolution of generated source files.
//!
//! With parallelism 1 the generator writes `<table>.dat`. With parallelism
//! `P > 1` child `i` writes `<table>_<i>_<P>.dat`; small tables may only be
//! produced by some children, but every table needs at least one file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::catalog::TableUnit;
use crate::error::LoadError;

const EXTENSION: &str = ".dat";

/// Split `<table>_<child>_<P>.dat` into its parts.
fn parse_partition_name(file_name: &str) -> Option<(&str, u32, u32)> {
    let stem = file_name.strip_suffix(EXTENSION)?;
    let mut parts = stem.rsplitn(3, '_');
    let parallelism = parts.next()?.parse::<u32>().ok()?;
    let child = parts.next()?.parse::<u32>().ok()?;
    let table = parts.next()?;
    if table.is_empty() || child == 0 || child > parallelism {
        return None;
    }
    Some((table, child, parallelism))
}

fn file_names(dir: &Path) -> Result<Vec<String>, LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        LoadError::SourceNotFound(format!("cannot read {}: {}", dir.display(), e))
    })?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

/// Infer the partition count from the file names present in `dir`.
///
/// Only files belonging to known tables count. Files written with more than
/// one partition count make the directory ambiguous.
pub fn detect_parallelism(dir: &Path, units: &[TableUnit]) -> Result<u32, LoadError> {
    let known: BTreeSet<&str> = units.iter().map(|u| u.name.as_str()).collect();
    let mut degrees = BTreeSet::new();

    for name in file_names(dir)? {
        if let Some((table, _, parallelism)) = parse_partition_name(&name) {
            if known.contains(table) {
                degrees.insert(parallelism);
                continue;
            }
        }
        if let Some(table) = name.strip_suffix(EXTENSION) {
            if known.contains(table) {
                degrees.insert(1);
            }
        }
    }

    match degrees.len() {
        0 => Err(LoadError::SourceNotFound(format!(
            "no generated files in {}",
            dir.display()
        ))),
        1 => Ok(degrees.into_iter().next().unwrap_or(1)),
        _ => Err(LoadError::SourceNotFound(format!(
            "files in {} were generated with different parallelism: {:?}",
            dir.display(),
            degrees
        ))),
    }
}

/// Resolve every table's ordered source files for the given parallelism.
///
/// Fails without side effects if any table has no file.
pub fn resolve_sources(
    dir: &Path,
    units: &[TableUnit],
    parallelism: u32,
) -> Result<BTreeMap<String, Vec<PathBuf>>, LoadError> {
    if parallelism < 1 {
        return Err(LoadError::InvalidArgument(format!(
            "parallelism must be at least 1, got {parallelism}"
        )));
    }
    if !dir.is_dir() {
        return Err(LoadError::SourceNotFound(format!(
            "data directory {} does not exist",
            dir.display()
        )));
    }

    let mut resolved = BTreeMap::new();
    let mut missing = Vec::new();

    for unit in units {
        let files: Vec<PathBuf> = if parallelism == 1 {
            vec![dir.join(format!("{}{}", unit.name, EXTENSION))]
        } else {
            (1..=parallelism)
                .map(|child| dir.join(format!("{}_{}_{}{}", unit.name, child, parallelism, EXTENSION)))
                .collect()
        };
        let present: Vec<PathBuf> = files.into_iter().filter(|p| p.is_file()).collect();
        if present.is_empty() {
            missing.push(unit.name.clone());
        } else {
            resolved.insert(unit.name.clone(), present);
        }
    }

    if !missing.is_empty() {
        return Err(LoadError::SourceNotFound(format!(
            "no files for parallelism {} in {} for: {}",
            parallelism,
            dir.display(),
            missing.join(", ")
        )));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tpcds_tables;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), "1|x|\n").unwrap();
    }

    fn units() -> Vec<TableUnit> {
        vec![
            TableUnit::new("store_sales", &["ss_item_sk", "ss_ticket_number"]),
            TableUnit::new("store", &["s_store_sk"]),
        ]
    }

    #[test]
    fn test_parse_partition_name() {
        assert_eq!(
            parse_partition_name("store_sales_3_8.dat"),
            Some(("store_sales", 3, 8))
        );
        assert_eq!(parse_partition_name("store_sales.dat"), None);
        assert_eq!(parse_partition_name("store_9_8.dat"), None);
        assert_eq!(parse_partition_name("store_1_2.csv"), None);
    }

    #[test]
    fn test_single_file_layout() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "store_sales.dat");
        touch(temp_dir.path(), "store.dat");

        assert_eq!(detect_parallelism(temp_dir.path(), &units()).unwrap(), 1);
        let sources = resolve_sources(temp_dir.path(), &units(), 1).unwrap();
        assert_eq!(sources["store"], vec![temp_dir.path().join("store.dat")]);
    }

    #[test]
    fn test_partitioned_layout_orders_children() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "store_sales_2_3.dat");
        touch(temp_dir.path(), "store_sales_1_3.dat");
        touch(temp_dir.path(), "store_sales_3_3.dat");
        // Small tables come from the first child only.
        touch(temp_dir.path(), "store_1_3.dat");

        assert_eq!(detect_parallelism(temp_dir.path(), &units()).unwrap(), 3);
        let sources = resolve_sources(temp_dir.path(), &units(), 3).unwrap();
        let names: Vec<_> = sources["store_sales"]
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["store_sales_1_3.dat", "store_sales_2_3.dat", "store_sales_3_3.dat"]
        );
        assert_eq!(sources["store"].len(), 1);
    }

    #[test]
    fn test_parallelism_mismatch_is_source_not_found() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "store_sales.dat");
        touch(temp_dir.path(), "store.dat");

        let err = resolve_sources(temp_dir.path(), &units(), 4).unwrap_err();
        match err {
            LoadError::SourceNotFound(msg) => {
                assert!(msg.contains("store_sales"));
                assert!(msg.contains("store"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mixed_parallelism_is_ambiguous() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "store.dat");
        touch(temp_dir.path(), "store_sales_1_2.dat");

        assert!(matches!(
            detect_parallelism(temp_dir.path(), &units()),
            Err(LoadError::SourceNotFound(_))
        ));
    }

    #[test]
    fn test_empty_or_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "unrelated_1_2.dat");
        assert!(matches!(
            detect_parallelism(temp_dir.path(), &tpcds_tables()),
            Err(LoadError::SourceNotFound(_))
        ));
        assert!(matches!(
            resolve_sources(&temp_dir.path().join("absent"), &units(), 1),
            Err(LoadError::SourceNotFound(_))
        ));
    }
}
