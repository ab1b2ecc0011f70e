use std::collections::BTreeSet;

use crate::models::mention::{RawMention, SourceKind};

/// The reconciled identity for one real teacher.
///
/// Only the reconciler builds these. Every `RawMention` handed to the
/// reconciler ends up in exactly one `CanonicalTeacher`.
#[derive(Debug, Clone)]
pub struct CanonicalTeacher {
    pub canonical_name: String,
    /// Every other spelling seen in sources or target lists, canonical excluded.
    pub aliases: BTreeSet<String>,
    pub mentions: Vec<RawMention>,
}

impl CanonicalTeacher {
    pub fn texts(&self, kind: SourceKind) -> impl Iterator<Item = &str> {
        self.mentions
            .iter()
            .filter(move |m| m.source_kind == kind && m.has_evidence())
            .map(|m| m.text.as_str())
    }

    /// All names this teacher is known by, canonical first.
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical_name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}
