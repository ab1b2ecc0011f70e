//! Prompt Composer: one prompt per canonical teacher.
//!
//! Survey comments and email excerpts are deduplicated verbatim and numbered.
//! A missing evidence kind is stated explicitly in the prompt so the model
//! does not fill the gap. Style exemplars are fenced and labelled as style only.

use std::collections::HashSet;

use crate::errors::AwardsError;
use crate::generation::prompts::{
    COLLEAGUE_SECTION_HEADER, NO_COLLEAGUE_OPINIONS, NO_STUDENT_FEEDBACK,
    RECOMMENDATION_PROMPT_TEMPLATE, STUDENT_SECTION_HEADER, STYLE_SECTION_HEADER,
};
use crate::models::{CanonicalTeacher, SourceKind, StyleExample};

/// A prompt plus the evidence that went into it, kept for the sources block.
#[derive(Debug, Clone)]
pub struct ComposedPrompt {
    pub teacher: String,
    pub prompt: String,
    pub survey_quotes: Vec<String>,
    pub email_excerpts: Vec<String>,
}

/// Builds the prompt for `teacher`. Fails with `EmptyEvidence` when the
/// teacher has neither a usable survey comment nor an email excerpt.
pub fn compose_prompt(
    teacher: &CanonicalTeacher,
    style: &[StyleExample],
) -> Result<ComposedPrompt, AwardsError> {
    let survey_quotes = dedup(teacher.texts(SourceKind::Survey).map(|t| t.trim().to_string()));
    let email_excerpts = dedup(teacher.texts(SourceKind::Email).map(collapse_lines));

    if survey_quotes.is_empty() && email_excerpts.is_empty() {
        return Err(AwardsError::EmptyEvidence {
            teacher: teacher.canonical_name.clone(),
        });
    }

    let student_section = numbered_section(
        STUDENT_SECTION_HEADER,
        NO_STUDENT_FEEDBACK,
        "Student",
        &survey_quotes,
    );
    let colleague_section = numbered_section(
        COLLEAGUE_SECTION_HEADER,
        NO_COLLEAGUE_OPINIONS,
        "Colleague",
        &email_excerpts,
    );

    let prompt = RECOMMENDATION_PROMPT_TEMPLATE
        .replace("{teacher_name}", &teacher.canonical_name)
        .replace("{student_section}", &student_section)
        .replace("{colleague_section}", &colleague_section)
        .replace("{style_section}", &style_section(style));

    Ok(ComposedPrompt {
        teacher: teacher.canonical_name.clone(),
        prompt,
        survey_quotes,
        email_excerpts,
    })
}

fn dedup(texts: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    texts
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Joins a multi-line excerpt into one line.
pub fn collapse_lines(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn numbered_section(header: &str, when_empty: &str, label: &str, items: &[String]) -> String {
    if items.is_empty() {
        return when_empty.to_string();
    }
    let mut section = header.to_string();
    for (i, item) in items.iter().enumerate() {
        section.push_str(&format!("\n- {label} {}: \"{item}\"", i + 1));
    }
    section
}

fn style_section(style: &[StyleExample]) -> String {
    if style.is_empty() {
        return String::new();
    }
    let mut section = format!("\n{STYLE_SECTION_HEADER}\n");
    for (i, example) in style.iter().enumerate() {
        section.push_str(&format!(
            "\nStyle example {} (style only, not evidence):\n```\n{}\n```\n",
            i + 1,
            example.text
        ));
    }
    section
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::models::RawMention;

    fn teacher(mentions: Vec<RawMention>) -> CanonicalTeacher {
        CanonicalTeacher {
            canonical_name: "Dr. Ada Lovelace".to_string(),
            aliases: BTreeSet::new(),
            mentions,
        }
    }

    #[test]
    fn test_survey_quotes_are_numbered_and_deduplicated() {
        let t = teacher(vec![
            RawMention::survey("Ada Lovelace", "Clear lectures", "s#2"),
            RawMention::survey("Lovelace", "Clear lectures", "s#3"),
            RawMention::survey("Lovelace", "Kind in office hours", "s#4"),
        ]);

        let composed = compose_prompt(&t, &[]).unwrap();
        assert_eq!(composed.survey_quotes, vec!["Clear lectures", "Kind in office hours"]);
        assert!(composed.prompt.contains("- Student 1: \"Clear lectures\""));
        assert!(composed.prompt.contains("- Student 2: \"Kind in office hours\""));
        assert!(composed.prompt.contains(NO_COLLEAGUE_OPINIONS));
        assert!(!composed.prompt.contains("{teacher_name}"));
    }

    #[test]
    fn test_email_only_teacher_composes() {
        let t = teacher(vec![RawMention::email(
            "Ada Lovelace",
            "Ada Lovelace\nran the best lab.",
            "m#L1",
        )]);

        let composed = compose_prompt(&t, &[]).unwrap();
        assert_eq!(composed.email_excerpts, vec!["Ada Lovelace ran the best lab."]);
        assert!(composed.prompt.contains(NO_STUDENT_FEEDBACK));
        assert!(composed.prompt.contains("- Colleague 1: \"Ada Lovelace ran the best lab.\""));
    }

    #[test]
    fn test_no_usable_text_is_empty_evidence() {
        let t = teacher(vec![RawMention::survey("Ada Lovelace", "  ", "s#2")]);
        assert!(matches!(
            compose_prompt(&t, &[]),
            Err(AwardsError::EmptyEvidence { teacher }) if teacher == "Dr. Ada Lovelace"
        ));
    }

    #[test]
    fn test_style_examples_are_fenced_and_labelled() {
        let t = teacher(vec![RawMention::survey("Ada", "Great", "s#2")]);
        let style = vec![StyleExample {
            source_id: "style.txt".to_string(),
            text: "It is my pleasure to nominate...".to_string(),
        }];

        let composed = compose_prompt(&t, &style).unwrap();
        assert!(composed.prompt.contains(STYLE_SECTION_HEADER));
        assert!(composed
            .prompt
            .contains("```\nIt is my pleasure to nominate...\n```"));
        assert!(composed.survey_quotes.iter().all(|q| !q.contains("pleasure")));
    }
}
