use std::path::PathBuf;

use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
///
/// Per-source and per-teacher variants are recorded and the batch moves on;
/// only `Usage` and `Config` stop the process.
#[derive(Debug, Error)]
pub enum AwardsError {
    #[error("Could not parse {source_id}: {message}")]
    Parse { source_id: String, message: String },

    #[error("No evidence found for requested teacher(s): {}", names.join(", "))]
    UnmatchedTeacher { names: Vec<String> },

    #[error("No usable comments or opinions for {teacher}")]
    EmptyEvidence { teacher: String },

    #[error("Generation failed for {teacher}: {source}")]
    Generation {
        teacher: String,
        #[source]
        source: LlmError,
    },

    #[error("Could not write {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AwardsError {
    pub fn parse(source_id: impl Into<String>, message: impl ToString) -> Self {
        AwardsError::Parse {
            source_id: source_id.into(),
            message: message.to_string(),
        }
    }

    /// Process exit code for an error that ends the run.
    pub fn exit_code(&self) -> u8 {
        match self {
            AwardsError::Usage(_) => 2,
            _ => 1,
        }
    }
}
