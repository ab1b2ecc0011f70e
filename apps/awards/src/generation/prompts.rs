// All LLM prompt constants for recommendation generation.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Upper bound for the finished document, template included.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Roughly 4000 characters of narrative.
pub const RECOMMENDATION_MAX_TOKENS: u32 = 1000;

pub const RECOMMENDATION_SYSTEM: &str = "You are an assistant helping to draft teaching award \
    recommendations. Your output is only the recommendation text itself; it is embedded in a \
    larger document that already has a title and a closing line.";

/// Replace `{teacher_name}`, `{student_section}`, `{colleague_section}` and
/// `{style_section}` before sending.
pub const RECOMMENDATION_PROMPT_TEMPLATE: &str = r#"Task: Write a compelling, concise recommendation (at most 4000 characters) for a teaching award for {teacher_name}.
Highlight their strengths using the student feedback and colleague opinions below.
Start with the recommendation itself, with no preamble such as "Here is the recommendation".
The tone is positive, celebratory and professional.

Teacher: {teacher_name}

{student_section}

{colleague_section}
{style_section}
Instructions:
- Synthesize the feedback and opinions into one coherent recommendation.
- Point to specific qualities or achievements where the evidence shows them.
- Do NOT invent facts that are not supported by the quotes above.
- Do NOT add a title such as "Recommendation message:" or a sign-off; the surrounding template provides both."#;

pub const STUDENT_SECTION_HEADER: &str = "Student feedback (quotes):";
pub const NO_STUDENT_FEEDBACK: &str =
    "Student feedback: none was provided for this teacher. Do not invent student quotes.";

pub const COLLEAGUE_SECTION_HEADER: &str = "Colleague opinions (email excerpts):";
pub const NO_COLLEAGUE_OPINIONS: &str =
    "Colleague opinions: none were provided for this teacher. Do not invent colleague quotes.";

/// Introduces the exemplars. They must never be mistaken for evidence.
pub const STYLE_SECTION_HEADER: &str = "Style examples (style only, not evidence; match their tone and structure, never their facts):";
