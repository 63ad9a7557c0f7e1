//! Error types for clauseflow.
//!
//! Two error kinds can halt a run: [`ProviderError`] when the model call
//! itself cannot be completed, and [`StageParseError`] when the model replied
//! with something that does not fit the stage's record shape. Neither is
//! recovered from inside the pipeline.

use crate::core::PipelineStage;
use crate::schemas::StageResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Maximum number of characters of a raw reply kept in diagnostics maps.
const RAW_PREVIEW_CHARS: usize = 500;

/// The main error type for clauseflow operations.
#[derive(Debug, Error)]
pub enum ClauseflowError {
    /// The model provider could not complete a call.
    #[error("{0}")]
    Provider(#[from] ProviderError),

    /// A model reply did not match the stage schema.
    #[error("{0}")]
    StageParse(#[from] StageParseError),

    /// A pipeline run failed.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid or missing configuration.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by a model client.
///
/// Every variant is terminal for the pipeline. Whether the client retried
/// before giving up is the client's business; see [`ProviderError::is_retryable`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderError {
    /// The provider rejected the credentials.
    #[error("Authentication failed: {message}")]
    Auth {
        /// Provider message.
        message: String,
    },

    /// The provider throttled the request.
    #[error("Rate limited by provider{}", retry_after_secs.map(|s| format!(" (retry after {s}s)")).unwrap_or_default())]
    RateLimited {
        /// Seconds the provider asked us to wait, if it said.
        retry_after_secs: Option<u64>,
    },

    /// The request never produced an HTTP response.
    #[error("Network failure: {message}")]
    Network {
        /// Underlying transport message.
        message: String,
    },

    /// The call did not finish in time.
    #[error("Model call timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// The provider answered with a non-success status.
    #[error("Provider returned HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// The provider answered but the envelope could not be read.
    #[error("Malformed provider response: {message}")]
    MalformedResponse {
        /// What was wrong with it.
        message: String,
    },
}

impl ProviderError {
    /// Creates an authentication error.
    #[must_use]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Creates a rate limit error.
    #[must_use]
    pub fn rate_limited(retry_after_secs: Option<u64>) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(timeout: std::time::Duration) -> Self {
        Self::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Creates an HTTP status error.
    #[must_use]
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Creates a malformed response error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Short machine-readable kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::RateLimited { .. } => "rate_limited",
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::Http { .. } => "http",
            Self::MalformedResponse { .. } => "malformed_response",
        }
    }

    /// Returns true if repeating the same call might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network { .. } | Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            Self::Auth { .. } | Self::MalformedResponse { .. } => false,
        }
    }

    /// The wait the provider asked for, if any.
    #[must_use]
    pub fn retry_after(&self) -> Option<std::time::Duration> {
        match self {
            Self::RateLimited {
                retry_after_secs: Some(secs),
            } => Some(std::time::Duration::from_secs(*secs)),
            _ => None,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!("ProviderError"));
        map.insert("kind".to_string(), serde_json::json!(self.kind()));
        map.insert("retryable".to_string(), serde_json::json!(self.is_retryable()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// A model reply that could not be turned into the stage's record.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Stage '{stage}' returned an unusable response: {reason}")]
pub struct StageParseError {
    /// The stage whose reply failed to parse.
    pub stage: PipelineStage,
    /// Why the reply was rejected.
    pub reason: String,
    /// The reply exactly as the model returned it.
    pub raw_response: String,
}

impl StageParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(
        stage: PipelineStage,
        reason: impl Into<String>,
        raw_response: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            reason: reason.into(),
            raw_response: raw_response.into(),
        }
    }

    /// Converts to a dictionary representation.
    ///
    /// The raw response is truncated to keep log lines bounded.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let preview: String = self.raw_response.chars().take(RAW_PREVIEW_CHARS).collect();
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!("StageParseError"));
        map.insert("stage".to_string(), serde_json::json!(self.stage.name()));
        map.insert("reason".to_string(), serde_json::json!(self.reason));
        map.insert("raw_response".to_string(), serde_json::json!(preview));
        map.insert(
            "raw_response_chars".to_string(),
            serde_json::json!(self.raw_response.chars().count()),
        );
        map
    }
}

/// Why a single stage did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    /// The model call failed.
    #[error("{0}")]
    Provider(ProviderError),

    /// The model reply did not parse.
    #[error("{0}")]
    Parse(StageParseError),

    /// The stage's inputs were missing or could not be rendered.
    #[error("Stage '{stage}' cannot run: {reason}")]
    Input {
        /// The stage that could not run.
        stage: PipelineStage,
        /// What was missing.
        reason: String,
    },

    /// The stage gate declined to proceed.
    #[error("Stage '{stage}' was declined before it started")]
    Declined {
        /// The stage that was not started.
        stage: PipelineStage,
    },
}

impl From<ProviderError> for StageError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}

impl From<StageParseError> for StageError {
    fn from(err: StageParseError) -> Self {
        Self::Parse(err)
    }
}

impl StageError {
    /// Creates an input error.
    #[must_use]
    pub fn input(stage: PipelineStage, reason: impl Into<String>) -> Self {
        Self::Input {
            stage,
            reason: reason.into(),
        }
    }

    /// Short machine-readable kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Provider(_) => "provider",
            Self::Parse(_) => "parse",
            Self::Input { .. } => "input",
            Self::Declined { .. } => "declined",
        }
    }

    /// Returns the provider error, if this is one.
    #[must_use]
    pub fn as_provider(&self) -> Option<&ProviderError> {
        match self {
            Self::Provider(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the parse error, if this is one.
    #[must_use]
    pub fn as_parse(&self) -> Option<&StageParseError> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        match self {
            Self::Provider(err) => err.to_dict(),
            Self::Parse(err) => err.to_dict(),
            Self::Input { stage, reason } => {
                let mut map = HashMap::new();
                map.insert("type".to_string(), serde_json::json!("StageInputError"));
                map.insert("stage".to_string(), serde_json::json!(stage.name()));
                map.insert("reason".to_string(), serde_json::json!(reason));
                map
            }
            Self::Declined { stage } => {
                let mut map = HashMap::new();
                map.insert("type".to_string(), serde_json::json!("StageDeclined"));
                map.insert("stage".to_string(), serde_json::json!(stage.name()));
                map
            }
        }
    }
}

/// A failed run, converted into an error for callers that use `?`.
///
/// Results produced before the failure are kept so they can still be shown.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Pipeline failed at stage '{stage}' after {} completed stage(s): {error}", partial_results.len())]
pub struct PipelineError {
    /// The failing stage.
    pub stage: PipelineStage,
    /// What went wrong.
    pub error: StageError,
    /// Results of the stages that completed before the failure.
    pub partial_results: Vec<StageResult>,
}

impl PipelineError {
    /// Creates a new pipeline error.
    #[must_use]
    pub fn new(stage: PipelineStage, error: StageError, partial_results: Vec<StageResult>) -> Self {
        Self {
            stage,
            error,
            partial_results,
        }
    }
}

/// Invalid or missing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No API key was configured.
    #[error("No API key configured (checked: {})", searched.join(", "))]
    MissingApiKey {
        /// Environment variables that were checked.
        searched: Vec<String>,
    },

    /// A field has an unusable value.
    #[error("Invalid configuration for '{field}': {message}")]
    Invalid {
        /// The offending field.
        field: String,
        /// Why it is invalid.
        message: String,
    },

    /// The configuration file could not be read or parsed.
    #[error("Could not load configuration from '{path}': {message}")]
    Load {
        /// The file path.
        path: String,
        /// The underlying problem.
        message: String,
    },
}

impl ConfigError {
    /// Creates an invalid field error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}
