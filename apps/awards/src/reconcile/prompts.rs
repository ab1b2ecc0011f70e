// Prompt templates for alias generation.

pub const ALIAS_SYSTEM: &str = "You are an expert in personal names and naming conventions \
    across cultures. You list the short forms and nicknames people actually use for a name.";

/// Replace `{teacher_name}` and `{faculty}` before sending.
pub const ALIAS_PROMPT_TEMPLATE: &str = r#"Teacher's full name: '{teacher_name}'
Other teachers in the same faculty: {faculty}

List the alternative names colleagues or students are likely to use for '{teacher_name}' in email:
1. Common shortenings of the given name (Thomas -> Tom, Elizabeth -> Liz).
2. Initial plus surname where that is customary (T. Monk).
3. Well-known nicknames (William -> Bill).
4. Widely adopted anglicised forms for names from other traditions.

Rules:
- Output one line: the aliases separated by commas, nothing else.
- Do NOT repeat '{teacher_name}' itself.
- Leave out anything that could equally refer to another teacher in the list above.
- If no safe alias exists, answer None.

Example for 'Thomas Monk': Tom, T. Monk, Tommy
Example for 'Raffaele Blasone': Raffi, Raf"#;
