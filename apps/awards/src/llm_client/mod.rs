//! LLM Client: the single point of entry for every text-generation call.
//!
//! ARCHITECTURAL RULE: No other module may call the chat-completions API directly.
//! Callers depend on the `TextGenerator` trait so batch logic can run against a fake.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

pub mod prompts;

/// Upper bound for a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl LlmError {
    /// Rate limits, server errors and network timeouts are worth retrying.
    /// Auth failures and malformed requests are not.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Http(e) => e.is_timeout() || e.is_connect(),
            LlmError::Api { status, .. } => {
                matches!(*status, 408 | 409 | 429) || (500..600).contains(status)
            }
            LlmError::Parse(_) | LlmError::EmptyContent | LlmError::RetriesExhausted { .. } => {
                false
            }
        }
    }
}

/// One prompt to send to the generation service.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

/// Seam between batch logic and the remote service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatCompletion {
    /// Trimmed text of the first choice, if it has any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Chat-completions client with bounded exponential backoff.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_attempts: u32,
    retry_base_delay: Duration,
}

impl LlmClient {
    pub fn new(
        api_key: String,
        base_url: &str,
        model: String,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model,
            max_attempts: 3,
            retry_base_delay: Duration::from_secs(1),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        Ok(Self::new(
            config.api_key.clone(),
            &config.api_base_url,
            config.model.clone(),
            config.request_timeout,
        )?
        .with_retry(config.max_attempts, config.retry_base_delay))
    }

    pub fn with_retry(mut self, max_attempts: u32, base_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_base_delay = base_delay;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Makes one logical call, retrying transient failures with exponential backoff.
    /// Permanent failures return immediately.
    pub async fn call(&self, request: &GenerationRequest<'_>) -> Result<ChatCompletion, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system,
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt,
                },
            ],
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let delay = backoff_delay(self.retry_base_delay, attempt);
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.send_once(&body).await {
                Ok(completion) => return Ok(completion),
                Err(e) if e.is_transient() => {
                    warn!("Transient LLM failure: {e}");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts: self.max_attempts,
            last: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt was made".to_string()),
        })
    }

    async fn send_once(&self, body: &ChatRequest<'_>) -> Result<ChatCompletion, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        let completion: ChatCompletion = serde_json::from_slice(&bytes)?;

        if let Some(usage) = &completion.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(completion)
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, LlmError> {
        let completion = self.call(request).await?;
        completion
            .text()
            .map(String::from)
            .ok_or(LlmError::EmptyContent)
    }
}

/// Delay before retry number `attempt` (1-based): base, 2×base, 4×base, capped.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32 << attempt.saturating_sub(1).min(16);
    base.saturating_mul(factor).min(MAX_BACKOFF)
}
