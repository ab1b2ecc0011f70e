//! Optional LLM-assisted alias lookup.
//!
//! Aliases only widen the terms the email extractor searches for. They never
//! merge clusters, so a bad suggestion can at worst attribute one extra
//! email snippet.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use crate::llm_client::prompts::PLAIN_TEXT_ONLY;
use crate::llm_client::{GenerationRequest, TextGenerator};
use crate::reconcile::prompts::{ALIAS_PROMPT_TEMPLATE, ALIAS_SYSTEM};

const ALIAS_MAX_TOKENS: u32 = 60;
const ALIAS_TEMPERATURE: f32 = 0.2;

/// Asks the generation service for aliases of `name`. Failures are logged and
/// yield no aliases.
pub async fn generate_aliases(llm: &dyn TextGenerator, name: &str, faculty: &[String]) -> Vec<String> {
    let others: Vec<&str> = faculty
        .iter()
        .map(String::as_str)
        .filter(|other| !other.eq_ignore_ascii_case(name))
        .collect();
    let faculty_list = if others.is_empty() {
        "None available".to_string()
    } else {
        others.join(", ")
    };

    let prompt = ALIAS_PROMPT_TEMPLATE
        .replace("{teacher_name}", name)
        .replace("{faculty}", &faculty_list);
    let system = format!("{ALIAS_SYSTEM} {PLAIN_TEXT_ONLY}");

    let request = GenerationRequest {
        system: &system,
        prompt: &prompt,
        max_tokens: ALIAS_MAX_TOKENS,
        temperature: Some(ALIAS_TEMPERATURE),
    };

    match llm.generate(&request).await {
        Ok(reply) => parse_alias_reply(&reply, name, faculty),
        Err(e) => {
            warn!("Alias lookup failed for {name}: {e}");
            Vec::new()
        }
    }
}

/// Splits a comma-separated reply, dropping the name itself, other faculty
/// names and duplicates (all case-insensitive).
pub fn parse_alias_reply(reply: &str, name: &str, faculty: &[String]) -> Vec<String> {
    let reply = reply.trim();
    if reply.is_empty() || reply.eq_ignore_ascii_case("none") {
        return Vec::new();
    }

    let mut seen: HashSet<String> = faculty.iter().map(|f| f.trim().to_lowercase()).collect();
    seen.insert(name.trim().to_lowercase());

    reply
        .split(',')
        .map(|alias| alias.trim().trim_end_matches('.').trim())
        .filter(|alias| !alias.is_empty() && !alias.eq_ignore_ascii_case("none"))
        .filter(|alias| seen.insert(alias.to_lowercase()))
        .map(String::from)
        .collect()
}

/// Aliases for every known name, keyed by that name.
pub async fn alias_table(llm: &dyn TextGenerator, names: &[String]) -> BTreeMap<String, Vec<String>> {
    let mut table = BTreeMap::new();
    for name in names {
        let aliases = generate_aliases(llm, name, names).await;
        if aliases.is_empty() {
            debug!("No aliases suggested for {name}");
        } else {
            info!("Aliases for {name}: {}", aliases.join(", "));
        }
        table.insert(name.clone(), aliases);
    }
    table
}
