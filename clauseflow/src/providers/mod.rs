//! Model client interface and implementations.
//!
//! The pipeline only sees [`ModelClient`]. Network clients own their own
//! retry and timeout policy; see [`retry`].

#[cfg(feature = "http")]
mod chat;
mod retry;

#[cfg(feature = "http")]
pub use chat::ChatCompletionsClient;
pub use retry::{
    should_retry, with_retry, BackoffStrategy, JitterStrategy, RetryDecision, RetryPolicy,
    RetryState, Retryable,
};

use crate::errors::ProviderError;
use crate::schemas::SchemaHint;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One prompt sent to a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRequest {
    /// The user prompt.
    pub prompt: String,
    /// Optional system instruction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Expected response shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_hint: Option<SchemaHint>,
    /// Caller label, used for logging and by scripted clients. Stages set it
    /// to their stage name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl ModelRequest {
    /// Creates a request with just a prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            schema_hint: None,
            tag: None,
        }
    }

    /// Sets the system instruction.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Sets the schema hint.
    #[must_use]
    pub fn with_schema_hint(mut self, hint: SchemaHint) -> Self {
        self.schema_hint = Some(hint);
        self
    }

    /// Sets the caller tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Returns true if the caller asked for a JSON reply.
    #[must_use]
    pub fn wants_json(&self) -> bool {
        self.schema_hint.as_ref().is_some_and(SchemaHint::expects_json)
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenUsage {
    /// Prompt tokens.
    pub prompt_tokens: u32,
    /// Completion tokens.
    pub completion_tokens: u32,
    /// Total tokens.
    pub total_tokens: u32,
}

/// The text a model produced for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Generated text.
    pub content: String,
    /// Model that answered, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Token usage, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    /// Why generation stopped, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    /// Wall-clock time of the call in milliseconds.
    #[serde(default)]
    pub latency_ms: u64,
}

impl ModelResponse {
    /// Creates a response carrying only text.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: None,
            usage: None,
            finish_reason: None,
            latency_ms: 0,
        }
    }

    /// Sets the model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the token usage.
    #[must_use]
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Returns true if the provider stopped because of the token limit.
    #[must_use]
    pub fn was_truncated(&self) -> bool {
        self.finish_reason.as_deref() == Some("length")
    }
}

/// A client for a hosted text-generation model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Sends one request and returns the generated text.
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, ProviderError>;
}
