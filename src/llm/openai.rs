//! OpenAI-compatible chat completions client
//!
//! Works with any endpoint that speaks the `/chat/completions` contract
//! (xAI, OpenAI, Ollama, vLLM, LM Studio, ...).

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::LlmSettings;
use crate::error::{Error, Result};

use super::{ChatMessage, Completion, CompletionRequest, GeneratorStats, TextGenerator, TokenUsage};

// ─────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────

/// Connection settings for the client
#[derive(Clone)]
pub struct OpenAiConfig {
    /// API base URL without the trailing `/chat/completions`
    pub base_url: String,

    /// API key (empty string for local servers)
    pub api_key: String,

    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retries on transient errors
    pub max_retries: u32,
}

impl From<&LlmSettings> for OpenAiConfig {
    fn from(settings: &LlmSettings) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            timeout_secs: settings.timeout_secs,
            max_retries: settings.max_retries,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// OpenAI API types (request/response)
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// ─────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────

/// Longest wait between two attempts
const MAX_BACKOFF_MS: u64 = 30_000;

/// Delay before retry `attempt` (1-based): 500ms doubling, capped
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_millis(500u64.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

/// HTTP client for an OpenAI-compatible endpoint
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
    total_requests: RwLock<u64>,
    total_tokens: RwLock<u64>,
}

impl OpenAiClient {
    /// Create a new client with the given configuration
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            base_url = %config.base_url,
            model = %config.model,
            authenticated = !config.api_key.is_empty(),
            "Text generation client created"
        );

        Ok(Self {
            config,
            client,
            total_requests: RwLock::new(0),
            total_tokens: RwLock::new(0),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Build the authorization header value (if API key is set)
    fn auth_header(&self) -> Option<String> {
        if self.config.api_key.is_empty() {
            None
        } else {
            Some(format!("Bearer {}", self.config.api_key))
        }
    }

    fn transport_error(&self, url: &str, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::TransportTimeout {
                url: url.to_string(),
                timeout_secs: self.config.timeout_secs,
            }
        } else {
            Error::transport(url, e.to_string())
        }
    }

    /// Make a chat completion request with retry logic
    async fn chat_completion(&self, request: &CompletionRequest) -> Result<Completion> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let url = self.endpoint();
        let mut last_error: Option<Error> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = backoff_delay(attempt);
                debug!(attempt, ?backoff, "Retrying after error");
                tokio::time::sleep(backoff).await;
            }

            let mut req = self.client.post(&url).json(&body);
            if let Some(ref auth) = self.auth_header() {
                req = req.header("Authorization", auth);
            }

            let response = match req.send().await {
                Ok(response) => response,
                Err(e) if e.is_timeout() || e.is_connect() => {
                    warn!(attempt, error = %e, "Retryable connection error");
                    last_error = Some(self.transport_error(&url, e));
                    continue;
                }
                Err(e) => return Err(self.transport_error(&url, e)),
            };

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let err = Error::ApiStatus {
                    status: status.as_u16(),
                    body,
                };
                if err.is_retryable() {
                    warn!(status = %status, attempt, "Retryable API error");
                    last_error = Some(err);
                    continue;
                }
                return Err(err);
            }

            let parsed: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|e| Error::malformed(format!("Failed to parse API response: {}", e)))?;

            *self.total_requests.write() += 1;

            let text = parsed
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| Error::malformed("No choices in API response"))?
                .message
                .content
                .unwrap_or_default();

            let usage = match parsed.usage {
                Some(u) => {
                    *self.total_tokens.write() += u64::from(u.total_tokens);
                    TokenUsage {
                        prompt_tokens: u.prompt_tokens,
                        completion_tokens: u.completion_tokens,
                        total_tokens: u.total_tokens,
                    }
                }
                None => TokenUsage::default(),
            };

            return Ok(Completion { text, usage });
        }

        Err(last_error.unwrap_or_else(|| Error::transport(&url, "All retry attempts exhausted")))
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        self.chat_completion(&request).await
    }

    fn stats(&self) -> GeneratorStats {
        GeneratorStats {
            requests: *self.total_requests.read(),
            total_tokens: *self.total_tokens.read(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
