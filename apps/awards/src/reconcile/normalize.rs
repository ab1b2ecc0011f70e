//! Name normalization shared by the reconciler and the email extractor.
//!
//! A normalized name is lowercase, punctuation-free, whitespace-collapsed,
//! with leading honorifics and trailing post-nominals removed, and
//! "Surname, Given" flipped to "given surname".

/// Honorifics stripped from the front of a name.
const TITLES: &[&str] = &[
    "dr", "doctor", "prof", "professor", "mr", "mrs", "ms", "miss", "mx", "sir", "dame", "madam",
];

/// Post-nominals stripped from the end of a name.
const SUFFIXES: &[&str] = &["phd", "dphil", "md", "jr", "sr", "ii", "iii", "esq"];

pub fn is_title(token: &str) -> bool {
    TITLES.contains(&token)
}

fn is_suffix(token: &str) -> bool {
    SUFFIXES.contains(&token)
}

/// Lowercases, turns punctuation into spaces and collapses whitespace.
/// Apostrophes and hyphens survive so "O'Neil" and "Smith-Jones" stay one token.
pub fn fold_text(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| match c {
            '\u{2019}' | '\u{2018}' => '\'',
            c if c.is_alphanumeric() || c == '\'' || c == '-' => c,
            _ => ' ',
        })
        .collect::<String>()
        .to_lowercase();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical comparison key for a teacher name.
pub fn normalize_name(raw: &str) -> String {
    let reordered = reorder_surname_first(raw);
    let folded = fold_text(&reordered);
    let mut tokens: Vec<&str> = folded.split_whitespace().collect();

    while tokens.len() > 1 && is_title(tokens[0]) {
        tokens.remove(0);
    }
    while tokens.len() > 1 && tokens.last().is_some_and(|t| is_suffix(t)) {
        tokens.pop();
    }

    tokens.join(" ")
}

/// "Lovelace, Ada" → "Ada Lovelace"; "Ada Lovelace, PhD" → "Ada Lovelace".
fn reorder_surname_first(raw: &str) -> String {
    if !raw.contains(',') {
        return raw.to_string();
    }

    let parts: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .filter(|p| !fold_text(p).split_whitespace().all(is_suffix))
        .collect();

    match parts.as_slice() {
        [surname, given] => format!("{given} {surname}"),
        _ => parts.join(" "),
    }
}

/// Collapses internal whitespace while keeping the original spelling and case.
pub fn display_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First given name with honorifics skipped, in its original case.
/// Falls back to the whole name when nothing but titles is present.
pub fn given_name(raw: &str) -> String {
    let reordered = reorder_surname_first(raw);
    reordered
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '-'))
        .find(|t| !t.is_empty() && !is_title(&t.to_lowercase()))
        .map(String::from)
        .unwrap_or_else(|| display_name(raw))
}

fn token_compatible(short: &str, long: &str) -> bool {
    if short == long {
        return true;
    }
    let is_initial = |a: &str, b: &str| a.chars().count() == 1 && b.starts_with(a);
    is_initial(short, long) || is_initial(long, short)
}

/// Whether the normalized name `short` can be a less formal spelling of `long`.
///
/// The surname (last token) must match exactly; every earlier token of `short`
/// must match, in order, an earlier token of `long` exactly or as an initial.
/// So "lovelace" and "a lovelace" fit "ada lovelace", while "ada" alone does not.
pub fn is_compatible(short: &str, long: &str) -> bool {
    let short: Vec<&str> = short.split_whitespace().collect();
    let long: Vec<&str> = long.split_whitespace().collect();

    let (Some((short_last, short_rest)), Some((long_last, long_rest))) =
        (short.split_last(), long.split_last())
    else {
        return false;
    };

    if short.len() > long.len() || short_last != long_last {
        return false;
    }

    let mut remaining = long_rest.iter();
    short_rest
        .iter()
        .all(|token| remaining.any(|candidate| token_compatible(token, candidate)))
}
