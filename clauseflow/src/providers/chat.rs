//! OpenAI-compatible `/chat/completions` client.

use super::retry::with_retry;
use super::{ModelClient, ModelRequest, ModelResponse, TokenUsage};
use crate::config::ModelClientConfig;
use crate::errors::{ConfigError, ProviderError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ResponseFormatParam {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatParam>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

/// Client for any provider speaking the OpenAI chat-completions protocol.
///
/// Holds one `reqwest::Client`, so clones of an `Arc` around it share a
/// connection pool. Failed requests are retried according to the configured
/// [`RetryPolicy`](super::RetryPolicy).
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    config: ModelClientConfig,
    timeout: Duration,
}

impl ChatCompletionsClient {
    /// Creates a client from a validated config.
    pub fn new(config: ModelClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let timeout = config.timeout()?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::invalid("http_client", e.to_string()))?;
        Ok(Self {
            http,
            config,
            timeout,
        })
    }

    /// Creates a client configured from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(ModelClientConfig::from_env()?)
    }

    /// The client configuration.
    #[must_use]
    pub fn config(&self) -> &ModelClientConfig {
        &self.config
    }

    fn build_payload(&self, request: &ModelRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.prompt.clone(),
        });

        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format: request
                .wants_json()
                .then_some(ResponseFormatParam { kind: "json_object" }),
        }
    }

    async fn send_once(&self, payload: &ChatCompletionRequest) -> Result<ModelResponse, ProviderError> {
        let started = Instant::now();
        let response = self
            .http
            .post(self.config.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(|e| self.transport_error(&e))?;

        if !status.is_success() {
            return Err(map_status(status.as_u16(), retry_after.as_deref(), body));
        }

        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        parse_envelope(&body, latency_ms)
    }

    fn transport_error(&self, error: &reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::timeout(self.timeout)
        } else {
            ProviderError::network(error.to_string())
        }
    }
}

/// Maps a non-success status to a provider error.
fn map_status(status: u16, retry_after: Option<&str>, body: String) -> ProviderError {
    match status {
        401 | 403 => ProviderError::auth(body),
        429 => ProviderError::rate_limited(retry_after.and_then(|v| v.trim().parse().ok())),
        _ => ProviderError::http(status, body),
    }
}

/// Reads the first choice out of a success body.
fn parse_envelope(body: &str, latency_ms: u64) -> Result<ModelResponse, ProviderError> {
    let envelope: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::malformed(format!("invalid response body: {e}")))?;

    let choice = envelope
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::malformed("response has no choices"))?;
    let content = choice
        .message
        .content
        .ok_or_else(|| ProviderError::malformed("first choice has no content"))?;

    Ok(ModelResponse {
        content,
        model: envelope.model,
        usage: envelope.usage,
        finish_reason: choice.finish_reason,
        latency_ms,
    })
}

#[async_trait]
impl ModelClient for ChatCompletionsClient {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, ProviderError> {
        let payload = self.build_payload(request);
        let label = request.tag.as_deref().unwrap_or("generate");

        tracing::debug!(
            call = label,
            model = %self.config.model,
            prompt_chars = request.prompt.chars().count(),
            json_mode = payload.response_format.is_some(),
            "Sending chat completion"
        );

        let response = with_retry(&self.config.retry, label, || self.send_once(&payload)).await?;

        tracing::debug!(
            call = label,
            latency_ms = response.latency_ms,
            total_tokens = response.usage.map(|u| u.total_tokens),
            finish_reason = response.finish_reason.as_deref(),
            "Chat completion received"
        );
        if response.was_truncated() {
            tracing::warn!(call = label, "Model reply was cut off at the token limit");
        }
        Ok(response)
    }
}
