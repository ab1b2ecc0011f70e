// Shared prompt fragments. Each module that calls the generation service keeps
// its own prompts.rs alongside it; only cross-cutting pieces live here.

/// Appended to every system prompt: the reply is embedded verbatim in a file.
pub const PLAIN_TEXT_ONLY: &str = "Reply with the requested text only. \
    Do NOT add a preamble, closing remarks, markdown headings, or code fences.";
