//! Dated run directories.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Create `<base>/<date>_sf<sf>`, or the first free `_2`, `_3`, ... variant.
pub fn make_run_dir(base_dir: &Path, date: &str, scale_factor: Option<u32>) -> Result<PathBuf> {
    let sf = scale_factor
        .map(|sf| sf.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let name = format!("{date}_sf{sf}");

    let mut run_dir = base_dir.join(&name);
    let mut suffix = 2;
    while run_dir.exists() {
        run_dir = base_dir.join(format!("{name}_{suffix}"));
        suffix += 1;
    }
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create run directory {}", run_dir.display()))?;
    Ok(run_dir)
}

/// Whether a directory name looks like `YYYY-MM-DD_sf...`.
pub(crate) fn is_run_dir_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() > 13
        && bytes[..10]
            .iter()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { *b == b'-' } else { b.is_ascii_digit() })
        && &bytes[10..13] == b"_sf"
}
