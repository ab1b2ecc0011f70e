//! Style reference reader. Exemplars steer tone and format only; they are
//! never quoted as evidence.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, info, warn};

use crate::errors::AwardsError;
use crate::extract::extension_of;
use crate::models::StyleExample;

/// Plain text of one style document.
pub fn read_style_document(path: &Path) -> Result<String, AwardsError> {
    let source = path.display().to_string();
    let text = match extension_of(path).as_str() {
        "docx" => docx_text(path),
        "pdf" => pdf_extract::extract_text(path).map_err(|e| e.to_string()),
        "txt" | "md" => fs::read_to_string(path).map_err(|e| e.to_string()),
        other => Err(format!("unsupported style document type '{other}'")),
    }
    .map_err(|message| AwardsError::parse(&source, message))?;

    Ok(text.trim().to_string())
}

/// Reads up to `limit` non-empty exemplars from `paths`, in order.
/// Unreadable documents are returned as errors alongside the exemplars.
pub fn load_style_examples(paths: &[PathBuf], limit: Option<usize>) -> (Vec<StyleExample>, Vec<AwardsError>) {
    let limit = limit.unwrap_or(usize::MAX);
    let mut examples = Vec::new();
    let mut errors = Vec::new();

    for path in paths {
        if examples.len() >= limit {
            break;
        }
        match read_style_document(path) {
            Ok(text) if text.is_empty() => debug!("Skipping empty style document {}", path.display()),
            Ok(text) => examples.push(StyleExample {
                source_id: path.display().to_string(),
                text,
            }),
            Err(e) => {
                warn!("{e}");
                errors.push(e);
            }
        }
    }

    info!("Loaded {} style exemplar(s)", examples.len());
    (examples, errors)
}

/// Paragraph text from `word/document.xml`, one paragraph per line.
fn docx_text(path: &Path) -> Result<String, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| e.to_string())?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| e.to_string())?
        .read_to_string(&mut xml)
        .map_err(|e| e.to_string())?;

    document_xml_text(&xml).map_err(|e| e.to_string())
}

fn document_xml_text(xml: &str) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                _ => {}
            },
            Event::Text(e) if in_run_text => text.push_str(&e.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}
