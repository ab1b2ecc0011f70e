use std::path::PathBuf;

use clap::Parser;

use crate::config::ConfigOverrides;
use crate::errors::AwardsError;
use crate::extract::targets::load_targets;

/// Command-line surface for the `awards` binary.
#[derive(Debug, Parser)]
#[command(
    name = "awards",
    version,
    about = "Draft teaching-award recommendations from survey comments and colleague emails"
)]
pub struct Cli {
    /// Only process these teachers
    #[arg(short, long, num_args = 1.., value_name = "NAME")]
    pub teachers: Option<Vec<String>>,

    /// Only process teachers listed in a .txt (one per line) or .csv (first column) file
    #[arg(long, value_name = "PATH")]
    pub teachers_file: Option<PathBuf>,

    /// Model identifier (overrides AWARDS_MODEL)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Directory for generated documents (overrides AWARDS_OUTPUT_DIR)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Use at most this many style exemplars
    #[arg(long, value_name = "K")]
    pub max_style_examples: Option<usize>,

    /// Ask the model for nicknames to widen the email search
    #[arg(long)]
    pub llm_aliases: bool,

    /// Stop before generating anything if a requested teacher has no evidence
    #[arg(long)]
    pub exit_on_miss: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// The requested target list, or `None` to process every teacher.
    ///
    /// `--teachers` and `--teachers-file` are mutually exclusive; giving both
    /// is a usage error raised before any source is read.
    pub fn target_names(&self) -> Result<Option<Vec<String>>, AwardsError> {
        match (&self.teachers, &self.teachers_file) {
            (Some(_), Some(_)) => Err(AwardsError::Usage(
                "--teachers and --teachers-file cannot be used together".to_string(),
            )),
            (Some(names), None) => {
                let names: Vec<String> = names
                    .iter()
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .collect();
                if names.is_empty() {
                    Err(AwardsError::Usage("--teachers needs at least one name".to_string()))
                } else {
                    Ok(Some(names))
                }
            }
            (None, Some(path)) => load_targets(path).map(Some),
            (None, None) => Ok(None),
        }
    }

    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            model: self.model.clone(),
            output_dir: self.output_dir.clone(),
            max_style_examples: self.max_style_examples,
            llm_aliases: self.llm_aliases,
            exit_on_miss: self.exit_on_miss,
        }
    }

    /// Log level implied by `--verbose` / `--quiet`, if either was given.
    pub fn log_level(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("warn")
        } else {
            None
        }
    }
}
