mod cli;
mod config;
mod errors;
mod extract;
mod generation;
mod llm_client;
mod models;
mod reconcile;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::Cli;
use crate::config::Config;
use crate::errors::AwardsError;
use crate::generation::pipeline::run_batch;
use crate::llm_client::LlmClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(
                e.downcast_ref::<AwardsError>()
                    .map(AwardsError::exit_code)
                    .unwrap_or(1),
            )
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();

    // Usage problems stop the run before any source is read.
    let targets = cli.target_names()?;

    let config = Config::from_env()
        .map_err(|e| AwardsError::Config(format!("{e:#}")))?
        .with_overrides(cli.overrides());

    // Initialize structured logging
    let level = cli
        .log_level()
        .map(String::from)
        .unwrap_or_else(|| config.rust_log.clone());
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), level))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting awards v{}", env!("CARGO_PKG_VERSION"));

    let llm = LlmClient::from_config(&config)
        .map_err(|e| AwardsError::Config(format!("cannot build HTTP client: {e}")))?;
    info!("LLM client initialized (model: {})", llm.model());

    if let Some(targets) = &targets {
        info!("Restricting the run to {} teacher(s)", targets.len());
    }

    let summary = run_batch(&config, targets.as_deref(), &llm).await?;
    println!("{summary}");

    Ok(if summary.has_failures() { 1 } else { 0 })
}
