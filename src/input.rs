// src/input.rs
//
// Reading object names from key-list files or piped stdin.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

/// Collect one object name per line. Lines are trimmed and blank lines are
/// skipped; with `skip_comments`, lines starting with `#` are skipped too.
pub fn read_object_names<R: BufRead>(reader: R, skip_comments: bool) -> Result<Vec<String>> {
    let mut names = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read object name on line {}", idx + 1))?;
        let name = line.trim();
        if name.is_empty() {
            continue;
        }
        if skip_comments && name.starts_with('#') {
            warn!("Skipping comment on line {}: {}", idx + 1, name);
            continue;
        }
        names.push(name.to_string());
    }

    Ok(names)
}

/// Read names from a key-list file.
pub fn read_keylist(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open key list {}", path.display()))?;
    read_object_names(BufReader::new(file), true)
}
