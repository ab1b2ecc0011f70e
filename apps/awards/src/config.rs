use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SURVEY_SHEET: &str = "Instructor feedback - positive";

pub const SURVEY_EXTENSIONS: &[&str] = &["xlsx"];
pub const EMAIL_EXTENSIONS: &[&str] = &["eml"];
pub const STYLE_EXTENSIONS: &[&str] = &["docx", "pdf", "txt", "md"];

/// Run configuration, built once at startup from the environment plus CLI
/// overrides, then passed by reference to every component.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_base_url: String,
    pub model: String,
    pub survey_dir: PathBuf,
    pub survey_sheet: String,
    pub email_dir: PathBuf,
    pub style_dir: PathBuf,
    pub output_dir: PathBuf,
    /// `None` means every style exemplar found is used.
    pub max_style_examples: Option<usize>,
    pub max_attempts: u32,
    pub request_timeout: Duration,
    pub retry_base_delay: Duration,
    pub context_lines: usize,
    pub llm_aliases: bool,
    pub exit_on_miss: bool,
    pub rust_log: String,
}

/// Values supplied on the command line take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub max_style_examples: Option<usize>,
    pub llm_aliases: bool,
    pub exit_on_miss: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            api_key: require(&lookup, "OPENAI_API_KEY")?,
            api_base_url: var("AWARDS_API_BASE_URL", DEFAULT_API_BASE_URL),
            model: var("AWARDS_MODEL", DEFAULT_MODEL),
            survey_dir: PathBuf::from(var("AWARDS_SURVEY_DIR", "assets")),
            survey_sheet: var("AWARDS_SURVEY_SHEET", DEFAULT_SURVEY_SHEET),
            email_dir: PathBuf::from(var("AWARDS_EMAIL_DIR", "assets")),
            style_dir: PathBuf::from(var("AWARDS_STYLE_DIR", "style_examples")),
            output_dir: PathBuf::from(var("AWARDS_OUTPUT_DIR", "recommendation_messages")),
            max_style_examples: lookup("AWARDS_MAX_STYLE_EXAMPLES")
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("AWARDS_MAX_STYLE_EXAMPLES must be a non-negative integer")?,
            max_attempts: var("AWARDS_MAX_ATTEMPTS", "3")
                .parse::<u32>()
                .context("AWARDS_MAX_ATTEMPTS must be a positive integer")?
                .max(1),
            request_timeout: Duration::from_secs(
                var("AWARDS_TIMEOUT_SECS", "120")
                    .parse::<u64>()
                    .context("AWARDS_TIMEOUT_SECS must be a number of seconds")?,
            ),
            retry_base_delay: Duration::from_millis(
                var("AWARDS_RETRY_BASE_MS", "1000")
                    .parse::<u64>()
                    .context("AWARDS_RETRY_BASE_MS must be a number of milliseconds")?,
            ),
            context_lines: var("AWARDS_CONTEXT_LINES", "2")
                .parse::<usize>()
                .context("AWARDS_CONTEXT_LINES must be a non-negative integer")?,
            llm_aliases: parse_flag(&var("AWARDS_LLM_ALIASES", "false"))
                .context("AWARDS_LLM_ALIASES must be true or false")?,
            exit_on_miss: parse_flag(&var("AWARDS_EXIT_ON_MISS", "false"))
                .context("AWARDS_EXIT_ON_MISS must be true or false")?,
            rust_log: var("RUST_LOG", "info"),
        })
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(model) = overrides.model {
            self.model = model;
        }
        if let Some(dir) = overrides.output_dir {
            self.output_dir = dir;
        }
        if overrides.max_style_examples.is_some() {
            self.max_style_examples = overrides.max_style_examples;
        }
        self.llm_aliases |= overrides.llm_aliases;
        self.exit_on_miss |= overrides.exit_on_miss;
        self
    }
}

fn require<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("unrecognised boolean '{other}'"),
    }
}
