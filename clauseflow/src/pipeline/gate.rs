//! Hooks that let a caller pause between stages.

use crate::core::PipelineStage;
use crate::schemas::StageResult;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Consulted before every stage after the first.
///
/// Returning `false` halts the run as `Failed` at `next` with
/// [`StageError::Declined`](crate::errors::StageError::Declined).
#[async_trait]
pub trait StageGate: Send + Sync {
    /// Decides whether `next` may start, given the results so far.
    async fn should_proceed(&self, next: PipelineStage, completed: &[StageResult]) -> bool;
}

/// A gate that always proceeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoProceed;

#[async_trait]
impl StageGate for AutoProceed {
    async fn should_proceed(&self, _next: PipelineStage, _completed: &[StageResult]) -> bool {
        true
    }
}

/// A pending decision sent to the controlling side of a [`ChannelGate`].
#[derive(Debug)]
pub struct GateRequest {
    /// The stage waiting to start.
    pub next: PipelineStage,
    /// Results produced so far.
    pub completed: Vec<StageResult>,
    respond: oneshot::Sender<bool>,
}

impl GateRequest {
    /// Lets the stage start.
    pub fn proceed(self) {
        let _ = self.respond.send(true);
    }

    /// Halts the run.
    pub fn decline(self) {
        let _ = self.respond.send(false);
    }
}

/// A gate answered over a channel, for UIs that step through stages.
///
/// A dropped receiver, a dropped request or an elapsed timeout all count as
/// a decline.
#[derive(Debug, Clone)]
pub struct ChannelGate {
    requests: mpsc::Sender<GateRequest>,
    timeout: Option<Duration>,
}

impl ChannelGate {
    /// Creates a gate and the receiver its decisions are requested on.
    #[must_use]
    pub fn channel() -> (Self, mpsc::Receiver<GateRequest>) {
        let (tx, rx) = mpsc::channel(1);
        (
            Self {
                requests: tx,
                timeout: None,
            },
            rx,
        )
    }

    /// Declines automatically if no decision arrives in time.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl StageGate for ChannelGate {
    async fn should_proceed(&self, next: PipelineStage, completed: &[StageResult]) -> bool {
        let (respond, decision) = oneshot::channel();
        let request = GateRequest {
            next,
            completed: completed.to_vec(),
            respond,
        };
        if self.requests.send(request).await.is_err() {
            tracing::warn!(stage = %next, "Stage gate receiver dropped; declining");
            return false;
        }

        let outcome = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, decision).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!(stage = %next, "Stage gate timed out; declining");
                    return false;
                }
            },
            None => decision.await,
        };
        outcome.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::ParsedDocument;

    #[tokio::test]
    async fn test_auto_proceed() {
        assert!(AutoProceed.should_proceed(PipelineStage::Ner, &[]).await);
    }

    #[tokio::test]
    async fn test_channel_gate_proceed_and_decline() {
        let (gate, mut rx) = ChannelGate::channel();
        let completed = vec![StageResult::Parsing(ParsedDocument::default())];

        let controller = tokio::spawn(async move {
            let first = rx.recv().await.unwrap();
            assert_eq!(first.next, PipelineStage::ClauseExtraction);
            assert_eq!(first.completed.len(), 1);
            first.proceed();

            rx.recv().await.unwrap().decline();
        });

        assert!(gate.should_proceed(PipelineStage::ClauseExtraction, &completed).await);
        assert!(!gate.should_proceed(PipelineStage::Ner, &completed).await);
        controller.await.unwrap();
    }

    #[tokio::test]
    async fn test_channel_gate_dropped_receiver_declines() {
        let (gate, rx) = ChannelGate::channel();
        drop(rx);
        assert!(!gate.should_proceed(PipelineStage::Ner, &[]).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_gate_timeout_declines() {
        let (gate, mut rx) = ChannelGate::channel();
        let gate = gate.with_timeout(Duration::from_secs(5));

        let holder = tokio::spawn(async move {
            let request = rx.recv().await;
            tokio::time::sleep(Duration::from_secs(60)).await;
            drop(request);
        });

        assert!(!gate.should_proceed(PipelineStage::Summarization, &[]).await);
        holder.abort();
    }
}
