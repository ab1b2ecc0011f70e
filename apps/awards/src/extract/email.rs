//! Email extractor.
//!
//! Emails are reduced to trimmed, non-blank text lines (Subject first), then
//! searched for every known teacher name. Each hit becomes an opinion: the
//! matching line plus `context_lines` lines either side.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use mailparse::{parse_mail, DispositionType, MailHeaderMap, ParsedMail};
use regex::Regex;
use scraper::{Html, Node};
use tracing::{debug, warn};

use crate::errors::AwardsError;
use crate::models::RawMention;
use crate::reconcile::normalize::{fold_text, normalize_name};

/// Honorifics people put in front of a bare surname in email ("Dr. Lovelace").
const SURNAME_TITLES: &[&str] = &["dr", "doctor", "prof", "professor", "mr", "mrs", "ms"];

const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "li", "tr", "td", "th", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote",
    "pre", "table", "ul", "ol", "hr",
];

/// The text content of one email, one entry per non-blank line.
#[derive(Debug, Clone)]
pub struct EmailDocument {
    pub source_id: String,
    pub lines: Vec<String>,
}

impl EmailDocument {
    pub fn parse(raw: &[u8], source_id: impl Into<String>) -> Result<Self, AwardsError> {
        let source_id = source_id.into();
        let mail = parse_mail(raw).map_err(|e| AwardsError::parse(&source_id, e))?;

        let mut blocks = Vec::new();
        if let Some(subject) = mail.headers.get_first_value("Subject") {
            blocks.push(subject);
        }
        collect_text(&mail, &mut blocks).map_err(|e| AwardsError::parse(&source_id, e))?;

        let lines = blocks
            .iter()
            .flat_map(|block| block.lines())
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        Ok(Self { source_id, lines })
    }
}

pub fn read_email(path: &Path) -> Result<EmailDocument, AwardsError> {
    let source_id = path.display().to_string();
    let raw = fs::read(path).map_err(|e| AwardsError::parse(&source_id, e))?;
    let document = EmailDocument::parse(&raw, source_id)?;
    debug!("{}: {} text lines", document.source_id, document.lines.len());
    Ok(document)
}

fn collect_text(part: &ParsedMail<'_>, out: &mut Vec<String>) -> Result<(), mailparse::MailParseError> {
    if part.get_content_disposition().disposition == DispositionType::Attachment {
        return Ok(());
    }

    let mimetype = part.ctype.mimetype.to_ascii_lowercase();

    if mimetype.starts_with("multipart/") {
        // Alternatives carry the same content twice; plain text is enough.
        if mimetype == "multipart/alternative" {
            if let Some(plain) = part
                .subparts
                .iter()
                .find(|p| p.ctype.mimetype.eq_ignore_ascii_case("text/plain"))
            {
                return collect_text(plain, out);
            }
        }
        for sub in &part.subparts {
            collect_text(sub, out)?;
        }
        return Ok(());
    }

    match mimetype.as_str() {
        "text/plain" => out.push(part.get_body()?),
        "text/html" => out.push(html_to_text(&part.get_body()?)),
        other => debug!("Skipping {other} part"),
    }
    Ok(())
}

/// Text nodes of an HTML document, with block elements starting new lines.
/// Script and style contents are dropped.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();

    for node in document.root_element().descendants() {
        match node.value() {
            Node::Element(element) if BLOCK_ELEMENTS.contains(&element.name()) => text.push('\n'),
            Node::Text(chunk) => {
                let hidden = node
                    .parent()
                    .and_then(|p| p.value().as_element())
                    .is_some_and(|e| matches!(e.name(), "script" | "style" | "head" | "title"));
                if !hidden {
                    text.push_str(chunk);
                }
            }
            _ => {}
        }
    }

    text
}

/// A known teacher name and the folded terms that identify it in text.
#[derive(Debug, Clone)]
pub struct SearchName {
    pub name: String,
    pattern: Regex,
}

impl SearchName {
    pub fn new(name: &str, aliases: &[String]) -> Option<Self> {
        let mut terms: Vec<String> = Vec::new();
        let mut push = |term: String| {
            if !term.is_empty() && !terms.contains(&term) {
                terms.push(term);
            }
        };

        for variant in std::iter::once(name).chain(aliases.iter().map(String::as_str)) {
            push(fold_text(variant));
            push(normalize_name(variant));
        }

        let normalized = normalize_name(name);
        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        if let [_, .., surname] = tokens.as_slice() {
            for title in SURNAME_TITLES {
                push(format!("{title} {surname}"));
            }
        }

        if terms.is_empty() {
            return None;
        }

        // Longest first so the alternation prefers the fullest form.
        terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternation = terms
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = match Regex::new(&format!(r"\b(?:{alternation})\b")) {
            Ok(pattern) => pattern,
            Err(e) => {
                warn!("Cannot build search pattern for '{name}': {e}");
                return None;
            }
        };

        debug!("Email search terms for {name}: {}", terms.join(" | "));
        Some(Self {
            name: name.to_string(),
            pattern,
        })
    }

    pub fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(&fold_text(line))
    }
}

/// Search names for every known name, with any generated aliases attached.
pub fn search_names(known: &[String], aliases: &BTreeMap<String, Vec<String>>) -> Vec<SearchName> {
    known
        .iter()
        .filter_map(|name| {
            let extra = aliases.get(name).map(Vec::as_slice).unwrap_or_default();
            SearchName::new(name, extra)
        })
        .collect()
}

/// Opinion mentions for every name hit in every document.
/// Identical snippets for the same name are kept once.
pub fn find_opinions(documents: &[EmailDocument], names: &[SearchName], context_lines: usize) -> Vec<RawMention> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut mentions = Vec::new();

    for document in documents {
        for (idx, line) in document.lines.iter().enumerate() {
            for search in names.iter().filter(|s| s.matches(line)) {
                let start = idx.saturating_sub(context_lines);
                let end = (idx + context_lines + 1).min(document.lines.len());
                let snippet = document.lines[start..end].join("\n");

                if seen.insert((search.name.clone(), snippet.clone())) {
                    mentions.push(RawMention::email(
                        search.name.clone(),
                        snippet,
                        format!("{}#L{}", document.source_id, idx + 1),
                    ));
                }
            }
        }
    }

    mentions
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = "From: dean@example.edu\r\n\
        To: awards@example.edu\r\n\
        Subject: Nomination for Dr. Lovelace\r\n\
        Content-Type: text/plain; charset=utf-8\r\n\
        \r\n\
        Hello committee,\r\n\
        \r\n\
        I worked with Ada Lovelace on the analytics course.\r\n\
        Her notes were meticulous.\r\n\
        Students loved the labs.\r\n\
        Regards\r\n";

    const MULTIPART: &str = "Subject: Feedback\r\n\
        MIME-Version: 1.0\r\n\
        Content-Type: multipart/mixed; boundary=\"outer\"\r\n\
        \r\n\
        --outer\r\n\
        Content-Type: multipart/alternative; boundary=\"inner\"\r\n\
        \r\n\
        --inner\r\n\
        Content-Type: text/plain\r\n\
        \r\n\
        Charles Babbage ran a great seminar.\r\n\
        --inner\r\n\
        Content-Type: text/html\r\n\
        \r\n\
        <p>Charles Babbage ran a <b>great</b> seminar.</p>\r\n\
        --inner--\r\n\
        --outer\r\n\
        Content-Type: text/plain\r\n\
        Content-Disposition: attachment; filename=\"notes.txt\"\r\n\
        \r\n\
        Attachment text about Ada Lovelace.\r\n\
        --outer--\r\n";

    fn doc(lines: &[&str]) -> EmailDocument {
        EmailDocument {
            source_id: "mail.eml".to_string(),
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn test_plain_email_lines_start_with_subject() {
        let email = EmailDocument::parse(PLAIN.as_bytes(), "plain.eml").unwrap();
        assert_eq!(email.lines[0], "Nomination for Dr. Lovelace");
        assert_eq!(email.lines[1], "Hello committee,");
        assert!(email.lines.iter().all(|l| !l.trim().is_empty()));
        assert_eq!(email.lines.len(), 6);
    }

    #[test]
    fn test_multipart_prefers_plain_and_skips_attachments() {
        let email = EmailDocument::parse(MULTIPART.as_bytes(), "multi.eml").unwrap();
        assert_eq!(
            email.lines,
            vec!["Feedback", "Charles Babbage ran a great seminar."]
        );
    }

    #[test]
    fn test_html_to_text_drops_markup_and_scripts() {
        let text = html_to_text(
            "<html><head><style>p {}</style></head><body><p>Ada was <i>superb</i>.</p>\
             <script>var x;</script><p>Second</p></body></html>",
        );
        let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        assert_eq!(lines, vec!["Ada was superb.", "Second"]);
    }

    #[test]
    fn test_context_window_around_hit() {
        let names = search_names(&["Ada Lovelace".to_string()], &BTreeMap::new());
        let email = doc(&["one", "two", "Ada Lovelace was great", "three", "four", "five"]);

        let mentions = find_opinions(&[email], &names, 1);
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].raw_name, "Ada Lovelace");
        assert_eq!(mentions[0].text, "two\nAda Lovelace was great\nthree");
        assert_eq!(mentions[0].source_id, "mail.eml#L3");
    }

    #[test]
    fn test_title_and_surname_form_matches() {
        let names = search_names(&["Ada Lovelace".to_string()], &BTreeMap::new());
        let email = doc(&["Please thank DR. LOVELACE for me."]);
        assert_eq!(find_opinions(&[email], &names, 2).len(), 1);
    }

    #[test]
    fn test_word_boundary_prevents_partial_hits() {
        let names = search_names(&["Ada Lovelace".to_string()], &BTreeMap::new());
        let email = doc(&["Adam Lovelaces visited", "Lovelace alone is not enough"]);
        assert!(find_opinions(&[email], &names, 0).is_empty());
    }

    #[test]
    fn test_aliases_widen_search() {
        let aliases = BTreeMap::from([("Thomas Monk".to_string(), vec!["Tom".to_string()])]);
        let names = search_names(&["Thomas Monk".to_string()], &aliases);
        let email = doc(&["Tom is the best TA we have had"]);

        let mentions = find_opinions(&[email], &names, 0);
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].raw_name, "Thomas Monk");
    }

    #[test]
    fn test_duplicate_snippets_are_dropped() {
        let names = search_names(&["Ada Lovelace".to_string()], &BTreeMap::new());
        let first = doc(&["Ada Lovelace is kind"]);
        let second = EmailDocument {
            source_id: "forward.eml".to_string(),
            ..first.clone()
        };

        assert_eq!(find_opinions(&[first, second], &names, 2).len(), 1);
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_email(&dir.path().join("absent.eml")),
            Err(AwardsError::Parse { .. })
        ));
    }
}
