//! Retry with backoff and jitter for model calls.
//!
//! Used by network clients around a single provider request. The pipeline
//! itself never retries a stage.

use crate::errors::ProviderError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Backoff strategy for retry delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// delay = base * 2^attempt
    #[default]
    Exponential,
    /// delay = base * (attempt + 1)
    Linear,
    /// delay = base
    Constant,
}

/// Jitter applied on top of the backoff delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterStrategy {
    /// No jitter
    None,
    /// Random from 0 to delay
    #[default]
    Full,
    /// Half fixed, half random
    Equal,
    /// min(max, random(base, prev * 3))
    Decorrelated,
}

/// Errors that know whether repeating the call could help.
pub trait Retryable {
    /// Returns true if the same call may succeed on a later attempt.
    fn is_retryable(&self) -> bool;

    /// A wait requested by the remote side, overriding the computed delay.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl Retryable for ProviderError {
    fn is_retryable(&self) -> bool {
        ProviderError::is_retryable(self)
    }

    fn retry_after(&self) -> Option<Duration> {
        ProviderError::retry_after(self)
    }
}

fn default_max_attempts() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

/// Retry behaviour for one provider call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Base delay between attempts in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Backoff strategy.
    #[serde(default)]
    pub backoff_strategy: BackoffStrategy,
    /// Jitter strategy.
    #[serde(default)]
    pub jitter_strategy: JitterStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_strategy: BackoffStrategy::Exponential,
            jitter_strategy: JitterStrategy::Full,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that makes exactly one attempt.
    #[must_use]
    pub fn none() -> Self {
        Self::default().with_max_attempts(1)
    }

    /// Sets the maximum attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay_ms(mut self, delay: u64) -> Self {
        self.base_delay_ms = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay_ms(mut self, delay: u64) -> Self {
        self.max_delay_ms = delay;
        self
    }

    /// Sets the backoff strategy.
    #[must_use]
    pub fn with_backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff_strategy = strategy;
        self
    }

    /// Sets the jitter strategy.
    #[must_use]
    pub fn with_jitter(mut self, strategy: JitterStrategy) -> Self {
        self.jitter_strategy = strategy;
        self
    }
}

/// Attempt tracking for one retried operation.
#[derive(Debug, Default)]
pub struct RetryState {
    /// Attempts made so far.
    pub attempt: usize,
    previous_delay_ms: Option<u64>,
}

impl RetryState {
    /// Creates a new retry state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no attempts remain.
    #[must_use]
    pub fn is_exhausted(&self, policy: &RetryPolicy) -> bool {
        self.attempt >= policy.max_attempts
    }

    /// Calculates the delay before the next attempt.
    ///
    /// `attempt` counts failed attempts so far, so the first retry uses the
    /// base delay.
    pub fn calculate_delay(&mut self, policy: &RetryPolicy) -> Duration {
        let base = policy.base_delay_ms;
        let max = policy.max_delay_ms;
        let exponent = u32::try_from(self.attempt.saturating_sub(1)).unwrap_or(u32::MAX);

        let delay = match policy.backoff_strategy {
            BackoffStrategy::Exponential => base.saturating_mul(2u64.saturating_pow(exponent)),
            BackoffStrategy::Linear => base.saturating_mul(u64::from(exponent) + 1),
            BackoffStrategy::Constant => base,
        }
        .min(max);

        let jittered = match policy.jitter_strategy {
            JitterStrategy::None => delay,
            JitterStrategy::Full => {
                if delay == 0 {
                    0
                } else {
                    rand::thread_rng().gen_range(0..=delay)
                }
            }
            JitterStrategy::Equal => {
                let half = delay / 2;
                if half == 0 {
                    delay
                } else {
                    half + rand::thread_rng().gen_range(0..=half)
                }
            }
            JitterStrategy::Decorrelated => {
                let prev = self.previous_delay_ms.unwrap_or(base);
                let upper = prev.saturating_mul(3).min(max);
                if upper <= base {
                    base
                } else {
                    rand::thread_rng().gen_range(base..=upper)
                }
            }
        };

        self.previous_delay_ms = Some(jittered);
        Duration::from_millis(jittered)
    }
}

/// Outcome of a retry decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry(Duration),
    /// No more attempts, give up.
    GiveUp,
    /// The error is not retryable.
    NotRetryable,
}

/// Decides what to do after a failed attempt.
///
/// The caller increments `state.attempt` before asking.
pub fn should_retry<E: Retryable>(
    state: &mut RetryState,
    policy: &RetryPolicy,
    error: &E,
) -> RetryDecision {
    if !error.is_retryable() {
        return RetryDecision::NotRetryable;
    }
    if state.is_exhausted(policy) {
        return RetryDecision::GiveUp;
    }
    let computed = state.calculate_delay(policy);
    let delay = error
        .retry_after()
        .map_or(computed, |requested| requested.min(Duration::from_millis(policy.max_delay_ms)));
    RetryDecision::Retry(delay)
}

/// Runs `operation` until it succeeds, fails terminally or runs out of attempts.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, label: &str, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let mut state = RetryState::new();

    loop {
        state.attempt += 1;
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => match should_retry(&mut state, policy, &e) {
                RetryDecision::Retry(delay) => {
                    tracing::warn!(
                        call = label,
                        attempt = state.attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Retrying model call"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp | RetryDecision::NotRetryable => return Err(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn no_jitter(base: u64) -> RetryPolicy {
        RetryPolicy::new()
            .with_base_delay_ms(base)
            .with_jitter(JitterStrategy::None)
    }

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay_ms, 1000);
        assert_eq!(policy.max_delay_ms, 30_000);
        assert_eq!(RetryPolicy::none().max_attempts, 1);
    }

    #[test]
    fn test_retry_policy_deserialize_partial() {
        let policy: RetryPolicy = serde_json::from_str(r#"{"max_attempts": 5}"#).unwrap();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.jitter_strategy, JitterStrategy::Full);
    }

    #[test]
    fn test_calculate_delay_exponential() {
        let policy = no_jitter(100);
        let mut state = RetryState::new();
        let delays: Vec<u128> = (1..=3)
            .map(|attempt| {
                state.attempt = attempt;
                state.calculate_delay(&policy).as_millis()
            })
            .collect();
        assert_eq!(delays, vec![100, 200, 400]);
    }

    #[test]
    fn test_calculate_delay_linear_and_constant() {
        let mut state = RetryState::new();
        state.attempt = 3;
        let linear = no_jitter(100).with_backoff(BackoffStrategy::Linear);
        assert_eq!(state.calculate_delay(&linear), Duration::from_millis(300));

        let constant = no_jitter(100).with_backoff(BackoffStrategy::Constant);
        assert_eq!(state.calculate_delay(&constant), Duration::from_millis(100));
    }

    #[test]
    fn test_calculate_delay_capped_at_max() {
        let policy = no_jitter(1000).with_max_delay_ms(5000);
        let mut state = RetryState::new();
        state.attempt = 11;
        assert_eq!(state.calculate_delay(&policy), Duration::from_millis(5000));
    }

    #[test]
    fn test_full_jitter_within_range() {
        let policy = RetryPolicy::new().with_base_delay_ms(100);
        let mut state = RetryState::new();
        state.attempt = 1;
        for _ in 0..50 {
            assert!(state.calculate_delay(&policy) <= Duration::from_millis(100));
        }
    }

    #[test]
    fn test_should_retry_decisions() {
        let policy = no_jitter(10).with_max_attempts(2);
        let mut state = RetryState::new();
        state.attempt = 1;

        assert_eq!(
            should_retry(&mut state, &policy, &ProviderError::auth("bad key")),
            RetryDecision::NotRetryable
        );
        assert_eq!(
            should_retry(&mut state, &policy, &ProviderError::network("reset")),
            RetryDecision::Retry(Duration::from_millis(10))
        );
        assert_eq!(
            should_retry(&mut state, &policy, &ProviderError::rate_limited(Some(1))),
            RetryDecision::Retry(Duration::from_secs(1))
        );

        state.attempt = 2;
        assert_eq!(
            should_retry(&mut state, &policy, &ProviderError::network("reset")),
            RetryDecision::GiveUp
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_recovers() {
        let calls = AtomicUsize::new(0);
        let policy = no_jitter(50).with_max_attempts(3);

        let result: Result<&str, ProviderError> = with_retry(&policy, "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ProviderError::http(503, "busy"))
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_stops_on_terminal_error() {
        let calls = AtomicUsize::new(0);
        let policy = no_jitter(50).with_max_attempts(5);

        let result: Result<(), ProviderError> = with_retry(&policy, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::auth("nope")) }
        })
        .await;

        assert!(matches!(result, Err(ProviderError::Auth { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_gives_up_after_max_attempts() {
        let calls = AtomicUsize::new(0);
        let policy = no_jitter(50).with_max_attempts(3);

        let result: Result<(), ProviderError> = with_retry(&policy, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::network("down")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
