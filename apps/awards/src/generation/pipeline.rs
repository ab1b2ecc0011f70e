//! Batch pipeline: one run from source documents to recommendation files.
//!
//! Flow: extract surveys → (optional) aliases → extract email opinions →
//!       load style exemplars → reconcile → per teacher: compose → generate →
//!       render → write.
//!
//! Everything before the per-teacher loop runs once. Inside the loop a
//! teacher's failure is recorded and the loop moves on.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::config::{Config, EMAIL_EXTENSIONS, STYLE_EXTENSIONS, SURVEY_EXTENSIONS};
use crate::errors::AwardsError;
use crate::extract::email::{find_opinions, read_email, search_names};
use crate::extract::list_files;
use crate::extract::style::load_style_examples;
use crate::extract::survey::extract_survey;
use crate::generation::composer::compose_prompt;
use crate::generation::document::render_document;
use crate::generation::prompts::{RECOMMENDATION_MAX_TOKENS, RECOMMENDATION_SYSTEM};
use crate::generation::writer::{plan_file_names, OutputWriter};
use crate::llm_client::prompts::PLAIN_TEXT_ONLY;
use crate::llm_client::{GenerationRequest, TextGenerator};
use crate::models::RawMention;
use crate::reconcile::aliases::alias_table;
use crate::reconcile::{known_names, reconcile};

// ────────────────────────────────────────────────────────────────────────────
// Run summary
// ────────────────────────────────────────────────────────────────────────────

/// Outcome of one batch. Every list is in canonical-name order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub succeeded: Vec<(String, PathBuf)>,
    /// Teachers left out without counting as failures (no usable evidence).
    pub skipped: Vec<(String, AwardsError)>,
    pub failed: Vec<(String, AwardsError)>,
    /// Target names with no evidence, reported once for the whole batch.
    pub unmatched: Option<AwardsError>,
    /// Source documents that could not be read.
    pub source_errors: Vec<AwardsError>,
}

impl RunSummary {
    /// True when any teacher failed; skipped and unmatched teachers do not count.
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Run summary: {} succeeded, {} skipped, {} failed",
            self.succeeded.len(),
            self.skipped.len(),
            self.failed.len()
        )?;
        for (name, path) in &self.succeeded {
            writeln!(f, "  succeeded: {name} -> {}", path.display())?;
        }
        for (name, reason) in &self.skipped {
            writeln!(f, "  skipped:   {name} ({reason})")?;
        }
        for (name, reason) in &self.failed {
            writeln!(f, "  failed:    {name} ({reason})")?;
        }
        if let Some(unmatched) = &self.unmatched {
            writeln!(f, "  unmatched: {unmatched}")?;
        }
        if !self.source_errors.is_empty() {
            writeln!(f, "  unreadable sources: {}", self.source_errors.len())?;
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Runs the whole batch.
///
/// Returns `Err` only when `exit_on_miss` is set and a target name matched
/// nothing; no document is generated in that case.
pub async fn run_batch(
    config: &Config,
    targets: Option<&[String]>,
    llm: &dyn TextGenerator,
) -> Result<RunSummary, AwardsError> {
    let mut summary = RunSummary::default();

    // Step 1: survey rows
    let mut mentions: Vec<RawMention> = Vec::new();
    for path in list_files(&config.survey_dir, SURVEY_EXTENSIONS) {
        match extract_survey(&path, &config.survey_sheet) {
            Ok(rows) => mentions.extend(rows),
            Err(e) => {
                warn!("{e}");
                summary.source_errors.push(e);
            }
        }
    }

    // Step 2: names to look for in email, optionally widened with aliases
    let known = known_names(&mentions, targets);
    let aliases = if config.llm_aliases {
        alias_table(llm, &known).await
    } else {
        BTreeMap::new()
    };

    // Step 3: email opinions
    let mut emails = Vec::new();
    for path in list_files(&config.email_dir, EMAIL_EXTENSIONS) {
        match read_email(&path) {
            Ok(email) => emails.push(email),
            Err(e) => {
                warn!("{e}");
                summary.source_errors.push(e);
            }
        }
    }
    let opinions = find_opinions(&emails, &search_names(&known, &aliases), config.context_lines);
    info!(
        "Found {} email opinion(s) in {} email(s)",
        opinions.len(),
        emails.len()
    );
    mentions.extend(opinions);

    // Step 4: style exemplars
    let style_paths = list_files(&config.style_dir, STYLE_EXTENSIONS);
    let (style, style_errors) = load_style_examples(&style_paths, config.max_style_examples);
    summary.source_errors.extend(style_errors);
    for example in &style {
        debug!("Style exemplar: {}", example.source_id);
    }

    // Step 5: reconcile
    info!("Reconciling {} mention(s)", mentions.len());
    let reconciliation = reconcile(mentions, targets);
    summary.unmatched = reconciliation.unmatched_error();

    if config.exit_on_miss {
        if let Some(unmatched) = summary.unmatched.take() {
            return Err(unmatched);
        }
    }

    info!(
        "{} teacher(s) to process, writing to {}",
        reconciliation.teachers.len(),
        config.output_dir.display()
    );

    // Step 6: one document per teacher
    let file_names = plan_file_names(reconciliation.teachers.keys().map(String::as_str));
    let writer = OutputWriter::new(&config.output_dir);
    let system = format!("{RECOMMENDATION_SYSTEM} {PLAIN_TEXT_ONLY}");

    for (name, teacher) in &reconciliation.teachers {
        let sources: BTreeSet<&str> = teacher
            .mentions
            .iter()
            .map(|m| m.source_id.split('#').next().unwrap_or_default())
            .collect();
        debug!(
            "{} known as [{}], {} mention(s) from {} source(s)",
            name,
            teacher.all_names().collect::<Vec<_>>().join(" / "),
            teacher.mentions.len(),
            sources.len()
        );

        let composed = match compose_prompt(teacher, &style) {
            Ok(composed) => composed,
            Err(e) => {
                warn!("Skipping {name}: {e}");
                summary.skipped.push((name.clone(), e));
                continue;
            }
        };

        info!(
            "Generating recommendation for {name} ({} student quote(s), {} email excerpt(s))",
            composed.survey_quotes.len(),
            composed.email_excerpts.len()
        );

        let request = GenerationRequest {
            system: &system,
            prompt: &composed.prompt,
            max_tokens: RECOMMENDATION_MAX_TOKENS,
            temperature: None,
        };

        let narrative = match llm.generate(&request).await {
            Ok(text) => text,
            Err(source) => {
                let e = AwardsError::Generation {
                    teacher: name.clone(),
                    source,
                };
                warn!("{e}");
                summary.failed.push((name.clone(), e));
                continue;
            }
        };

        let document = render_document(&composed, &narrative);
        let file_name = file_names
            .get(name)
            .cloned()
            .unwrap_or_else(|| format!("{name}.md"));

        match writer.write(&file_name, &document) {
            Ok(path) => summary.succeeded.push((name.clone(), path)),
            Err(e) => {
                warn!("{e}");
                summary.failed.push((name.clone(), e));
            }
        }
    }

    info!(
        "Done: {} succeeded, {} skipped, {} failed (output dir {})",
        summary.succeeded.len(),
        summary.skipped.len(),
        summary.failed.len(),
        writer.dir().display()
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::llm_client::LlmError;

    /// Echoes a fixed narrative; fails for prompts mentioning `fail_for`.
    struct FakeLlm {
        calls: AtomicUsize,
        fail_for: Option<&'static str>,
    }

    impl FakeLlm {
        fn new(fail_for: Option<&'static str>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_for,
            }
        }
    }

    #[async_trait]
    impl TextGenerator for FakeLlm {
        async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_for {
                Some(name) if request.prompt.contains(name) => Err(LlmError::Api {
                    status: 401,
                    message: "invalid api key".to_string(),
                }),
                _ => Ok("An outstanding and generous teacher.".to_string()),
            }
        }
    }

    const EMAIL: &str = "Subject: Award nominations\r\n\
        Content-Type: text/plain\r\n\
        \r\n\
        Ada Lovelace transformed our analytics course.\r\n\
        Students queue up for her office hours.\r\n\
        Separately, Charles Babbage built a superb lab sequence.\r\n";

    fn fixture() -> (TempDir, Config) {
        let root = tempfile::tempdir().unwrap();
        let emails = root.path().join("emails");
        let style = root.path().join("style");
        fs::create_dir(&emails).unwrap();
        fs::create_dir(&style).unwrap();
        fs::write(emails.join("nominations.eml"), EMAIL).unwrap();
        fs::write(style.join("sample.txt"), "It is my great pleasure to nominate...").unwrap();

        let vars: BTreeMap<&str, String> = BTreeMap::from([
            ("OPENAI_API_KEY", "sk-test".to_string()),
            ("AWARDS_SURVEY_DIR", path_str(&root.path().join("surveys"))),
            ("AWARDS_EMAIL_DIR", path_str(&emails)),
            ("AWARDS_STYLE_DIR", path_str(&style)),
            ("AWARDS_OUTPUT_DIR", path_str(&root.path().join("out"))),
            ("AWARDS_CONTEXT_LINES", "0".to_string()),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();
        (root, config)
    }

    fn path_str(path: &Path) -> String {
        path.display().to_string()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    fn output_files(config: &Config) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&config.output_dir) else {
            return Vec::new();
        };
        let mut files: Vec<String> = entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        files
    }

    #[tokio::test]
    async fn test_unmatched_target_reports_once_and_writes_nothing() {
        let (_root, config) = fixture();
        let llm = FakeLlm::new(None);
        let targets = names(&["Dr. Grace Hopper"]);

        let summary = run_batch(&config, Some(&targets), &llm).await.unwrap();

        assert!(matches!(
            &summary.unmatched,
            Some(AwardsError::UnmatchedTeacher { names }) if names == &targets
        ));
        assert!(summary.succeeded.is_empty());
        assert!(output_files(&config).is_empty());
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
        assert!(!summary.has_failures());
    }

    #[tokio::test]
    async fn test_exit_on_miss_stops_before_generation() {
        let (_root, mut config) = fixture();
        config.exit_on_miss = true;
        let llm = FakeLlm::new(None);
        let targets = names(&["Ada Lovelace", "Dr. Grace Hopper"]);

        let result = run_batch(&config, Some(&targets), &llm).await;

        assert!(matches!(result, Err(AwardsError::UnmatchedTeacher { .. })));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
        assert!(output_files(&config).is_empty());
    }

    #[tokio::test]
    async fn test_email_only_teacher_is_generated() {
        let (_root, config) = fixture();
        let llm = FakeLlm::new(None);
        let targets = names(&["Dr. Ada Lovelace"]);

        let summary = run_batch(&config, Some(&targets), &llm).await.unwrap();

        assert!(summary.skipped.is_empty());
        assert_eq!(summary.succeeded.len(), 1);
        assert_eq!(output_files(&config), vec!["Dr_Ada_Lovelace.md"]);

        let document = fs::read_to_string(&summary.succeeded[0].1).unwrap();
        assert!(document.starts_with("# Dr. Ada Lovelace\n"));
        assert!(document.contains("Fantastic job, Ada!"));
        assert!(document.contains("transformed our analytics course"));
    }

    #[tokio::test]
    async fn test_file_names_are_stable_across_runs() {
        let (_root, config) = fixture();
        let targets = names(&["Ada Lovelace", "Charles Babbage"]);

        run_batch(&config, Some(&targets), &FakeLlm::new(None))
            .await
            .unwrap();
        let first = output_files(&config);
        run_batch(&config, Some(&targets), &FakeLlm::new(None))
            .await
            .unwrap();

        assert_eq!(first, vec!["Ada_Lovelace.md", "Charles_Babbage.md"]);
        assert_eq!(output_files(&config), first);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_the_batch() {
        let (_root, config) = fixture();
        let llm = FakeLlm::new(Some("Charles Babbage"));
        let targets = names(&["Ada Lovelace", "Charles Babbage"]);

        let summary = run_batch(&config, Some(&targets), &llm).await.unwrap();

        assert!(summary.has_failures());
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "Charles Babbage");
        assert!(matches!(summary.failed[0].1, AwardsError::Generation { .. }));
        assert_eq!(output_files(&config), vec!["Ada_Lovelace.md"]);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 2);

        let printed = summary.to_string();
        assert!(printed.contains("1 succeeded, 0 skipped, 1 failed"));
        assert!(printed.contains("failed:    Charles Babbage"));
    }

    #[tokio::test]
    async fn test_no_targets_and_no_surveys_generates_nothing() {
        let (_root, config) = fixture();
        let llm = FakeLlm::new(None);

        let summary = run_batch(&config, None, &llm).await.unwrap();

        assert!(summary.succeeded.is_empty());
        assert!(summary.unmatched.is_none());
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }
}
