//! A model client that answers from a script.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::core::PipelineStage;
use crate::errors::ProviderError;
use crate::providers::{ModelClient, ModelRequest, ModelResponse};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(ProviderError),
}

/// Answers each request with the next scripted reply for the stage named in
/// the request tag.
///
/// Replies for a stage are consumed in order; the last one repeats, so the
/// same client can serve several identical runs. A request for a stage with
/// no script fails with a malformed response error.
#[derive(Debug, Default)]
pub struct ScriptedModelClient {
    replies: Mutex<HashMap<PipelineStage, VecDeque<Reply>>>,
    delays: HashMap<PipelineStage, Duration>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModelClient {
    /// Creates a client with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, stage: PipelineStage, reply: Reply) -> Self {
        self.replies.lock().entry(stage).or_default().push_back(reply);
        self
    }

    /// Queues a text reply for the stage.
    #[must_use]
    pub fn reply(self, stage: PipelineStage, content: impl Into<String>) -> Self {
        self.push(stage, Reply::Text(content.into()))
    }

    /// Queues a provider failure for the stage.
    #[must_use]
    pub fn fail(self, stage: PipelineStage, error: ProviderError) -> Self {
        self.push(stage, Reply::Fail(error))
    }

    /// Waits before answering any request for the stage.
    #[must_use]
    pub fn delay(mut self, stage: PipelineStage, delay: Duration) -> Self {
        self.delays.insert(stage, delay);
        self
    }

    /// Every request received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().clone()
    }

    /// Requests tagged with the stage.
    #[must_use]
    pub fn requests_for(&self, stage: PipelineStage) -> Vec<ModelRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.tag.as_deref() == Some(stage.name()))
            .cloned()
            .collect()
    }

    /// The prompt of the most recent request for the stage.
    #[must_use]
    pub fn last_prompt(&self, stage: PipelineStage) -> Option<String> {
        self.requests_for(stage).pop().map(|r| r.prompt)
    }

    /// Total requests received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Forgets recorded requests. The script is unchanged.
    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    fn next_reply(&self, stage: PipelineStage) -> Option<Reply> {
        let mut replies = self.replies.lock();
        let queue = replies.get_mut(&stage)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, ProviderError> {
        self.requests.lock().push(request.clone());

        let stage = request
            .tag
            .as_deref()
            .and_then(PipelineStage::from_name)
            .ok_or_else(|| ProviderError::malformed("request is not tagged with a stage"))?;

        if let Some(delay) = self.delays.get(&stage) {
            tokio::time::sleep(*delay).await;
        }

        match self.next_reply(stage) {
            Some(Reply::Text(content)) => Ok(ModelResponse::text(content).with_model("scripted")),
            Some(Reply::Fail(error)) => Err(error),
            None => Err(ProviderError::malformed(format!(
                "no scripted reply for stage '{stage}'"
            ))),
        }
    }
}
