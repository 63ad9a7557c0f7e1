//! Configuration for the model client and the pipeline.
//!
//! Configuration is always an explicit value handed to a constructor.
//! Environment and file loading are convenience constructors on top.

use crate::errors::ConfigError;
use crate::providers::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.aimlapi.com/v1";

/// Default model id.
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat";

/// Environment variables checked for the API key, in order.
pub const API_KEY_VARS: [&str; 3] = ["CLAUSEFLOW_API_KEY", "AIML_API_KEY", "OPENAI_API_KEY"];

/// Environment variable overriding the base URL.
pub const BASE_URL_VAR: &str = "CLAUSEFLOW_BASE_URL";

/// Environment variable overriding the model id.
pub const MODEL_VAR: &str = "CLAUSEFLOW_MODEL";

/// Environment variable overriding the request timeout, in seconds.
pub const TIMEOUT_VAR: &str = "CLAUSEFLOW_TIMEOUT_SECS";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> Option<u32> {
    Some(4096)
}

/// Converts a seconds value to a `Duration`, rejecting values that are not
/// positive or do not fit.
fn positive_seconds(field: &str, seconds: f64) -> Result<Duration, ConfigError> {
    match Duration::try_from_secs_f64(seconds) {
        Ok(duration) if !duration.is_zero() => Ok(duration),
        _ => Err(ConfigError::invalid(field, "must be a positive number of seconds")),
    }
}

fn default_request_timeout() -> f64 {
    60.0
}

/// Settings for a chat-completions model client.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelClientConfig {
    /// Bearer token. Never serialized.
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// API root, without the `/chat/completions` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model id.
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Completion token limit.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: Option<u32>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: f64,
    /// Retry behaviour for failed requests.
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for ModelClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_request_timeout(),
            retry: RetryPolicy::default(),
        }
    }
}

impl fmt::Debug for ModelClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelClientConfig")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ModelClientConfig {
    /// Creates a config with the given key and defaults for everything else.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Builds a config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self::default().apply_lookup(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Fills the key from the lookup if unset and applies any overrides it holds.
    pub fn apply_lookup<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if self.api_key.trim().is_empty() {
            self.api_key = API_KEY_VARS
                .iter()
                .find_map(|name| get(*name))
                .ok_or_else(|| ConfigError::MissingApiKey {
                    searched: API_KEY_VARS.iter().map(ToString::to_string).collect(),
                })?;
        }
        if let Some(url) = get(BASE_URL_VAR) {
            self.base_url = url;
        }
        if let Some(model) = get(MODEL_VAR) {
            self.model = model;
        }
        if let Some(raw) = get(TIMEOUT_VAR) {
            self.timeout_seconds = raw
                .parse()
                .map_err(|_| ConfigError::invalid(TIMEOUT_VAR, format!("'{raw}' is not a number")))?;
        }
        Ok(self)
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the model id.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the completion token limit.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Gets the timeout as a Duration.
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        positive_seconds("timeout_seconds", self.timeout_seconds)
    }

    /// Full chat-completions URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Checks every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey {
                searched: API_KEY_VARS.iter().map(ToString::to_string).collect(),
            });
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::invalid("base_url", "must start with http:// or https://"));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::invalid("model", "must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::invalid("temperature", "must be between 0 and 2"));
        }
        self.timeout()?;
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::invalid("retry.max_attempts", "must be at least 1"));
        }
        Ok(())
    }
}

/// What a failed run keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep the results of the stages that completed before the failure.
    #[default]
    KeepPartial,
    /// Drop all results when any stage fails.
    DiscardPartial,
}

fn default_chunk_size() -> usize {
    2000
}

fn default_chunk_overlap() -> usize {
    500
}

/// How the Parsing stage reads the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ParsingMode {
    /// One model call over the whole document.
    #[default]
    Whole,
    /// One model call per paragraph-aligned chunk, merged afterwards.
    Chunked {
        /// Target chunk size in characters.
        #[serde(default = "default_chunk_size")]
        chunk_size: usize,
        /// Characters of trailing context repeated at the next chunk's head.
        #[serde(default = "default_chunk_overlap")]
        overlap: usize,
    },
}

impl ParsingMode {
    /// Chunked parsing with the default sizes.
    #[must_use]
    pub fn chunked() -> Self {
        Self::Chunked {
            chunk_size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }

    /// Checks chunk sizes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Whole => Ok(()),
            Self::Chunked { chunk_size, overlap } => {
                if chunk_size == 0 {
                    Err(ConfigError::invalid("parsing_mode.chunk_size", "must be positive"))
                } else if overlap >= chunk_size {
                    Err(ConfigError::invalid(
                        "parsing_mode.overlap",
                        "must be smaller than chunk_size",
                    ))
                } else {
                    Ok(())
                }
            }
        }
    }
}

fn default_stage_timeout() -> f64 {
    120.0
}

/// Settings for the stage pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound on one stage's model call(s), in seconds.
    #[serde(default = "default_stage_timeout")]
    pub stage_timeout_seconds: f64,
    /// What a failed run keeps.
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// How the Parsing stage reads the document.
    #[serde(default)]
    pub parsing_mode: ParsingMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout_seconds: default_stage_timeout(),
            failure_policy: FailurePolicy::default(),
            parsing_mode: ParsingMode::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-stage timeout.
    #[must_use]
    pub fn with_stage_timeout(mut self, seconds: f64) -> Self {
        self.stage_timeout_seconds = seconds;
        self
    }

    /// Sets the failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Sets the parsing mode.
    #[must_use]
    pub fn with_parsing_mode(mut self, mode: ParsingMode) -> Self {
        self.parsing_mode = mode;
        self
    }

    /// Gets the stage timeout as a Duration.
    pub fn stage_timeout(&self) -> Result<Duration, ConfigError> {
        positive_seconds("stage_timeout_seconds", self.stage_timeout_seconds)
    }

    /// Checks every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.stage_timeout()?;
        self.parsing_mode.validate()
    }
}

/// Model and pipeline settings together, as stored in a config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClauseflowConfig {
    /// Model client settings.
    #[serde(default)]
    pub model: ModelClientConfig,
    /// Pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl ClauseflowConfig {
    /// Reads a JSON config file without validating it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let load_error = |message: String| ConfigError::Load {
            path: path.display().to_string(),
            message,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| load_error(e.to_string()))
    }

    /// Loads an optional config file, applies environment overrides and validates.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// Like [`ClauseflowConfig::load`], with an explicit variable lookup.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.model = config.model.apply_lookup(&lookup)?;
        config.model.validate()?;
        config.pipeline.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = ModelClientConfig::from_lookup(env(&[("AIML_API_KEY", "k-123")])).unwrap();

        assert_eq!(config.api_key, "k-123");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.endpoint(), "https://api.aimlapi.com/v1/chat/completions");
    }

    #[test]
    fn test_from_lookup_key_precedence_and_overrides() {
        let config = ModelClientConfig::from_lookup(env(&[
            ("OPENAI_API_KEY", "openai"),
            ("CLAUSEFLOW_API_KEY", "primary"),
            ("CLAUSEFLOW_BASE_URL", "http://localhost:8080/v1/"),
            ("CLAUSEFLOW_MODEL", "gpt-4o-mini"),
            ("CLAUSEFLOW_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();

        assert_eq!(config.api_key, "primary");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout().unwrap(), Duration::from_secs(15));
        assert_eq!(config.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_from_lookup_missing_key() {
        let err = ModelClientConfig::from_lookup(env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey { ref searched } if searched.len() == 3));
    }

    #[test]
    fn test_from_lookup_bad_timeout() {
        let err = ModelClientConfig::from_lookup(env(&[
            ("CLAUSEFLOW_API_KEY", "k"),
            ("CLAUSEFLOW_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == TIMEOUT_VAR));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = ModelClientConfig::new("k");
        assert!(base.validate().is_ok());
        assert!(base.clone().with_base_url("ftp://x").validate().is_err());
        assert!(base.clone().with_temperature(3.0).validate().is_err());
        assert!(base.clone().with_timeout(0.0).validate().is_err());
        assert!(base.clone().with_timeout(f64::NAN).validate().is_err());
        assert!(base.with_retry(RetryPolicy::new().with_max_attempts(0)).validate().is_err());
    }

    #[test]
    fn test_out_of_range_timeouts_are_errors() {
        let client = ModelClientConfig::new("k").with_timeout(1e20);
        assert!(matches!(
            client.timeout(),
            Err(ConfigError::Invalid { ref field, .. }) if field == "timeout_seconds"
        ));
        assert!(client.validate().is_err());

        for seconds in [1e20, -1.0, f64::INFINITY] {
            let pipeline = PipelineConfig::new().with_stage_timeout(seconds);
            assert!(matches!(
                pipeline.stage_timeout(),
                Err(ConfigError::Invalid { ref field, .. }) if field == "stage_timeout_seconds"
            ));
            assert!(pipeline.validate().is_err());
        }
        assert_eq!(
            PipelineConfig::new().with_stage_timeout(0.5).stage_timeout().unwrap(),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", ModelClientConfig::new("sk-very-secret"));
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_api_key_never_serialized() {
        let json = serde_json::to_string(&ModelClientConfig::new("sk-very-secret")).unwrap();
        assert!(!json.contains("sk-very-secret"));
    }

    #[test]
    fn test_parsing_mode_serde() {
        let mode: ParsingMode = serde_json::from_str(r#"{"mode": "chunked"}"#).unwrap();
        assert_eq!(mode, ParsingMode::chunked());
        assert_eq!(
            serde_json::from_str::<ParsingMode>(r#"{"mode": "whole"}"#).unwrap(),
            ParsingMode::Whole
        );
    }

    #[test]
    fn test_parsing_mode_validate() {
        assert!(ParsingMode::chunked().validate().is_ok());
        let bad = ParsingMode::Chunked {
            chunk_size: 100,
            overlap: 100,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_pipeline_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.stage_timeout().unwrap(), Duration::from_secs(120));
        assert_eq!(config.failure_policy, FailurePolicy::KeepPartial);
        assert_eq!(config.parsing_mode, ParsingMode::Whole);
        assert!(config.with_stage_timeout(-1.0).validate().is_err());
    }

    #[test]
    fn test_load_with_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"model": {{"model": "deepseek/deepseek-reasoner"}},
                "pipeline": {{"failure_policy": "discard_partial",
                              "parsing_mode": {{"mode": "chunked", "chunk_size": 1000}}}}}}"#
        )
        .unwrap();

        let config =
            ClauseflowConfig::load_with(Some(file.path()), env(&[("AIML_API_KEY", "k")])).unwrap();

        assert_eq!(config.model.model, "deepseek/deepseek-reasoner");
        assert_eq!(config.pipeline.failure_policy, FailurePolicy::DiscardPartial);
        assert_eq!(
            config.pipeline.parsing_mode,
            ParsingMode::Chunked {
                chunk_size: 1000,
                overlap: 500
            }
        );
    }

    #[test]
    fn test_load_with_bad_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = ClauseflowConfig::load_with(Some(file.path()), env(&[("AIML_API_KEY", "k")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
    }
}
