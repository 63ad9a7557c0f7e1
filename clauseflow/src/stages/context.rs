//! Per-stage execution context.

use crate::config::ParsingMode;
use crate::core::{Document, PipelineStage};
use crate::errors::{ProviderError, StageError};
use crate::providers::{ModelClient, ModelRequest, ModelResponse};
use crate::schemas::StageResult;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use uuid::Uuid;

/// Everything one stage may read while it runs.
///
/// Prior results are exposed only through [`StageContext::input`], which
/// refuses stages that are not earlier in the run or not yet produced.
pub struct StageContext<'a> {
    stage: PipelineStage,
    run_id: Uuid,
    document: &'a Document,
    normalized_text: &'a str,
    prior: &'a [StageResult],
    client: &'a dyn ModelClient,
    parsing_mode: ParsingMode,
    calls: AtomicUsize,
}

impl std::fmt::Debug for StageContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageContext")
            .field("stage", &self.stage)
            .field("run_id", &self.run_id)
            .field("prior", &self.prior.len())
            .field("parsing_mode", &self.parsing_mode)
            .finish_non_exhaustive()
    }
}

impl<'a> StageContext<'a> {
    /// Creates a context for one stage of a run.
    #[must_use]
    pub fn new(
        stage: PipelineStage,
        run_id: Uuid,
        document: &'a Document,
        normalized_text: &'a str,
        prior: &'a [StageResult],
        client: &'a dyn ModelClient,
    ) -> Self {
        Self {
            stage,
            run_id,
            document,
            normalized_text,
            prior,
            client,
            parsing_mode: ParsingMode::default(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Sets the parsing mode.
    #[must_use]
    pub fn with_parsing_mode(mut self, mode: ParsingMode) -> Self {
        self.parsing_mode = mode;
        self
    }

    /// The stage this context was built for.
    #[must_use]
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// The run id.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// The document being analyzed.
    #[must_use]
    pub fn document(&self) -> &Document {
        self.document
    }

    /// The normalized document text.
    #[must_use]
    pub fn normalized_text(&self) -> &str {
        self.normalized_text
    }

    /// The configured parsing mode.
    #[must_use]
    pub fn parsing_mode(&self) -> ParsingMode {
        self.parsing_mode
    }

    /// The result of the stage that ran immediately before, if any.
    #[must_use]
    pub fn previous(&self) -> Option<&StageResult> {
        self.prior.last()
    }

    /// The result of an earlier stage.
    pub fn input(&self, needed: PipelineStage) -> Result<&StageResult, StageError> {
        if needed >= self.stage {
            return Err(StageError::input(
                self.stage,
                format!("'{needed}' does not run before '{}'", self.stage),
            ));
        }
        self.prior
            .iter()
            .find(|r| r.stage() == needed)
            .ok_or_else(|| StageError::input(self.stage, format!("no '{needed}' result available")))
    }

    /// Sends one request to the model client.
    pub async fn call_model(&self, request: &ModelRequest) -> Result<ModelResponse, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        let started = Instant::now();
        let result = self.client.generate(request).await;

        match &result {
            Ok(response) => tracing::debug!(
                stage = %self.stage,
                call,
                prompt_chars = request.prompt.chars().count(),
                response_chars = response.content.chars().count(),
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "Model call completed"
            ),
            Err(e) => tracing::debug!(stage = %self.stage, call, error = %e, "Model call failed"),
        }
        result
    }

    /// Number of model calls made through this context.
    #[must_use]
    pub fn model_calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockModelClient;
    use crate::schemas::{ClauseSet, ParsedDocument};

    #[test]
    fn test_input_enforces_order_and_presence() {
        let document = Document::new("text");
        let client = MockModelClient::new();
        let prior = vec![
            StageResult::Parsing(ParsedDocument::default()),
            StageResult::ClauseExtraction(ClauseSet::default()),
        ];
        let ctx = StageContext::new(
            PipelineStage::Ner,
            Uuid::nil(),
            &document,
            "text",
            &prior,
            &client,
        );

        assert!(ctx.input(PipelineStage::ClauseExtraction).is_ok());
        assert_eq!(ctx.previous().map(StageResult::stage), Some(PipelineStage::ClauseExtraction));
        assert!(matches!(
            ctx.input(PipelineStage::Summarization),
            Err(StageError::Input { .. })
        ));
        assert!(matches!(ctx.input(PipelineStage::Ner), Err(StageError::Input { .. })));
    }

    #[test]
    fn test_input_missing_result() {
        let document = Document::new("text");
        let client = MockModelClient::new();
        let ctx = StageContext::new(
            PipelineStage::ClauseExtraction,
            Uuid::nil(),
            &document,
            "text",
            &[],
            &client,
        );
        let err = ctx.input(PipelineStage::Parsing).unwrap_err();
        assert!(err.to_string().contains("no 'Parsing' result"));
    }

    #[tokio::test]
    async fn test_call_model_counts_calls() {
        let document = Document::new("text");
        let mut client = MockModelClient::new();
        client
            .expect_generate()
            .times(2)
            .returning(|_| Ok(ModelResponse::text("{}")));
        let ctx = StageContext::new(
            PipelineStage::Parsing,
            Uuid::nil(),
            &document,
            "text",
            &[],
            &client,
        );

        ctx.call_model(&ModelRequest::new("a")).await.unwrap();
        ctx.call_model(&ModelRequest::new("b")).await.unwrap();
        assert_eq!(ctx.model_calls(), 2);
    }
}
