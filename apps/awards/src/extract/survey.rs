//! Survey extractor: one `RawMention` per spreadsheet row of the
//! positive-feedback sheet.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::{debug, info};

use crate::errors::AwardsError;
use crate::models::RawMention;

/// Rows searched for a usable header before giving up on a sheet.
const HEADER_SEARCH_ROWS: usize = 5;

/// Column indices of the instructor name and the free-text comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurveyColumns {
    pub name: usize,
    pub comment: usize,
}

/// Finds the name and comment columns in a header row.
///
/// Returns `None` rather than failing so the caller decides whether a sheet
/// without recognisable columns is an error.
pub fn discover_columns(headers: &[String]) -> Option<SurveyColumns> {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let find = |pred: &dyn Fn(&str) -> bool, exclude: Option<usize>| {
        lowered
            .iter()
            .enumerate()
            .find(|(i, h)| Some(*i) != exclude && pred(h.as_str()))
            .map(|(i, _)| i)
    };

    let name = find(&|h: &str| h == "instructor name" || h == "instructor", None)
        .or_else(|| find(&|h: &str| h.contains("instructor"), None))
        .or_else(|| find(&|h: &str| h.contains("name") || h.contains("teacher"), None))?;

    let comment = find(&|h: &str| h.contains("positive") && h.contains("comment"), Some(name))
        .or_else(|| find(&|h: &str| h.contains("comment"), Some(name)))?;

    Some(SurveyColumns { name, comment })
}

/// Converts sheet rows to mentions. The header is the first of the leading
/// rows that `discover_columns` accepts.
pub fn rows_to_mentions(rows: &[Vec<String>], source: &str) -> Result<Vec<RawMention>, AwardsError> {
    let (header_idx, columns) = rows
        .iter()
        .take(HEADER_SEARCH_ROWS)
        .enumerate()
        .find_map(|(i, row)| discover_columns(row).map(|c| (i, c)))
        .ok_or_else(|| AwardsError::parse(source, "no instructor name / comment columns found"))?;

    let cell = |row: &Vec<String>, idx: usize| {
        row.get(idx)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };

    let mentions = rows
        .iter()
        .enumerate()
        .skip(header_idx + 1)
        .filter_map(|(i, row)| {
            let name = cell(row, columns.name);
            if name.is_empty() {
                return None;
            }
            // Spreadsheet rows are 1-based.
            Some(RawMention::survey(
                name,
                cell(row, columns.comment),
                format!("{source}#row{}", i + 1),
            ))
        })
        .collect();

    Ok(mentions)
}

/// Reads the named sheet from one workbook. Sheet lookup is case-insensitive.
pub fn extract_survey(path: &Path, sheet: &str) -> Result<Vec<RawMention>, AwardsError> {
    let source = path.display().to_string();

    let mut workbook = open_workbook_auto(path).map_err(|e| AwardsError::parse(&source, e))?;

    let sheet_name = workbook
        .sheet_names()
        .into_iter()
        .find(|name| name.trim().eq_ignore_ascii_case(sheet.trim()))
        .ok_or_else(|| AwardsError::parse(&source, format!("sheet '{sheet}' not found")))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| AwardsError::parse(&source, e))?;

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    debug!("{source}: {} rows in '{sheet_name}'", rows.len());

    let mentions = rows_to_mentions(&rows, &source)?;
    info!("Extracted {} survey rows from {source}", mentions.len());
    Ok(mentions)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}
