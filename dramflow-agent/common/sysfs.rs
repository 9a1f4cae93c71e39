// Read helpers for kernel-exposed sysfs attributes
//
// Attributes are tiny text files; every helper degrades to `None` instead of
// failing so callers can apply their own defaults.

use std::fs;
use std::path::Path;

/// Whole file contents with surrounding whitespace removed
pub fn read_trimmed(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(contents) => Some(contents.trim().to_string()),
        Err(e) => {
            tracing::trace!("Cannot read {}: {}", path.display(), e);
            None
        }
    }
}

/// First line of the file, without the trailing newline
pub fn read_first_line(path: &Path) -> Option<String> {
    let contents = fs::read_to_string(path).ok()?;
    contents.lines().next().map(|line| line.trim().to_string())
}

/// First whitespace-separated token, or an empty string for an empty file
pub fn read_token(path: &Path) -> Option<String> {
    let contents = fs::read_to_string(path).ok()?;
    Some(
        contents
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string(),
    )
}

pub fn read_f64(path: &Path) -> Option<f64> {
    let value = read_trimmed(path)?;
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            tracing::debug!("Ignoring malformed value {:?} in {}", value, path.display());
            None
        }
    }
}

pub fn read_i64(path: &Path) -> Option<i64> {
    read_trimmed(path)?.parse().ok()
}

/// Names of the entries in a directory; empty when it cannot be listed
pub fn list_entries(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot list {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect()
}
