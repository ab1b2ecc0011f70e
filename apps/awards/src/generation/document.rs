//! Final Markdown document around the generated narrative.

use tracing::warn;

use crate::generation::composer::ComposedPrompt;
use crate::generation::prompts::MAX_MESSAGE_CHARS;
use crate::reconcile::normalize::given_name;

pub fn render_document(composed: &ComposedPrompt, narrative: &str) -> String {
    let mut sources = vec![
        "---".to_string(),
        "**Sources Used for Generation:**".to_string(),
        "**Student Feedback:**".to_string(),
    ];
    source_lines(&mut sources, &composed.survey_quotes, "No student feedback was available.");
    sources.push("**Colleague Opinions:**".to_string());
    source_lines(&mut sources, &composed.email_excerpts, "No colleague opinions were available.");

    let document = format!(
        "# {name}\n\n# Recommendation message:\n\n{narrative}\n\nFantastic job, {first}!\n\n{sources}\n",
        name = composed.teacher,
        narrative = narrative.trim(),
        first = given_name(&composed.teacher),
        sources = sources.join("\n"),
    );

    let length = document.chars().count();
    if length > MAX_MESSAGE_CHARS {
        warn!(
            "Recommendation for {} is {length} characters, over the {MAX_MESSAGE_CHARS} limit",
            composed.teacher
        );
    }

    document
}

fn source_lines(out: &mut Vec<String>, items: &[String], when_empty: &str) {
    if items.is_empty() {
        out.push(format!("- {when_empty}"));
    } else {
        out.extend(items.iter().map(|item| format!("- \"{item}\"")));
    }
}
