//! Target-list loading for `--teachers-file`.

use std::fs;
use std::path::Path;

use crate::errors::AwardsError;
use crate::extract::extension_of;

/// Names from a `.txt` (one per line) or `.csv` (first column, no header) file.
/// Any failure, including an empty result, is a usage error.
pub fn load_targets(path: &Path) -> Result<Vec<String>, AwardsError> {
    let content = fs::read_to_string(path).map_err(|e| {
        AwardsError::Usage(format!("cannot read teachers file {}: {e}", path.display()))
    })?;

    let names = match extension_of(path).as_str() {
        "txt" => parse_txt_targets(&content),
        "csv" => parse_csv_targets(&content)?,
        other => {
            return Err(AwardsError::Usage(format!(
                "teachers file must be .txt or .csv, got '.{other}'"
            )))
        }
    };

    if names.is_empty() {
        return Err(AwardsError::Usage(format!(
            "teachers file {} contains no names",
            path.display()
        )));
    }
    Ok(names)
}

pub fn parse_txt_targets(content: &str) -> Vec<String> {
    content
        .trim_start_matches('\u{feff}')
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

pub fn parse_csv_targets(content: &str) -> Result<Vec<String>, AwardsError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.trim_start_matches('\u{feff}').as_bytes());

    let mut names = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AwardsError::Usage(format!("malformed teachers csv: {e}")))?;
        if let Some(name) = record.get(0).map(str::trim).filter(|n| !n.is_empty()) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}
