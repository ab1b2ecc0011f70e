//! Output Writer: one Markdown file per teacher, named from the canonical name.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::AwardsError;

const FILE_EXTENSION: &str = "md";

/// Runs of characters other than letters and digits (any script) become one `_`.
/// A name with nothing left becomes `teacher`.
pub fn sanitize_file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            stem.push(c);
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "teacher".to_string()
    } else {
        stem.to_string()
    }
}

/// File name for each canonical name. Names are processed in sorted order and
/// collisions (case-insensitive, for case-insensitive filesystems) get `_2`,
/// `_3`, ... so the same inputs always produce the same names.
pub fn plan_file_names<'a>(names: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, String> {
    let mut sorted: Vec<&str> = names.into_iter().collect();
    sorted.sort_unstable();
    sorted.dedup();

    let mut taken: HashSet<String> = HashSet::new();
    let mut plan = BTreeMap::new();

    for name in sorted {
        let base = sanitize_file_stem(name);
        let mut stem = base.clone();
        let mut n = 2;
        while !taken.insert(stem.to_lowercase()) {
            stem = format!("{base}_{n}");
            n += 1;
        }
        plan.insert(name.to_string(), format!("{stem}.{FILE_EXTENSION}"));
    }

    plan
}

/// Writes documents into one directory, creating it on first use.
/// Existing files are overwritten.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, file_name: &str, contents: &str) -> Result<PathBuf, AwardsError> {
        fs::create_dir_all(&self.dir).map_err(|source| AwardsError::Output {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(file_name);
        fs::write(&path, contents).map_err(|source| AwardsError::Output {
            path: path.clone(),
            source,
        })?;

        info!("Saved {}", path.display());
        Ok(path)
    }
}
