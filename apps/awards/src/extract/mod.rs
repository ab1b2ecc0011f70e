//! Extractors: turn source documents into `RawMention`s, style exemplars and
//! target lists. Each source is read independently; an unreadable source is
//! reported as a `Parse` error and the rest carry on.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

pub mod email;
pub mod style;
pub mod survey;
pub mod targets;

/// Regular files directly inside `dir` whose extension is in `extensions`
/// (case-insensitive), sorted by path. Office lock files (`~$...`) are skipped.
/// A missing directory yields an empty list and a warning.
pub fn list_files(dir: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read directory {}: {e}", dir.display());
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            !path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("~$"))
        })
        .filter(|path| has_extension(path, extensions))
        .collect();

    files.sort();
    files
}

pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}

/// Lowercased extension, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}
