use std::fmt;

/// Where a mention was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKind {
    Survey,
    Email,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Survey => f.write_str("survey"),
            SourceKind::Email => f.write_str("email"),
        }
    }
}

/// One piece of evidence attributed to a raw, unreconciled teacher name.
///
/// Created by the extractors and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMention {
    pub raw_name: String,
    pub source_kind: SourceKind,
    pub text: String,
    /// File path (plus row or line locator) the text came from.
    pub source_id: String,
}

impl RawMention {
    pub fn survey(raw_name: impl Into<String>, text: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            raw_name: raw_name.into(),
            source_kind: SourceKind::Survey,
            text: text.into(),
            source_id: source_id.into(),
        }
    }

    pub fn email(raw_name: impl Into<String>, text: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            raw_name: raw_name.into(),
            source_kind: SourceKind::Email,
            text: text.into(),
            source_id: source_id.into(),
        }
    }

    /// True when the mention carries text that can be quoted in a prompt.
    pub fn has_evidence(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// A reference document used only to steer tone and format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleExample {
    pub source_id: String,
    pub text: String,
}
