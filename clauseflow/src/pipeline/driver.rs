//! The sequential stage driver.

use super::gate::{AutoProceed, StageGate};
use super::report::ProcessingResponse;
use super::run::{PipelineRun, StageTiming};
use crate::config::PipelineConfig;
use crate::core::{Document, PipelineStage};
use crate::errors::{ProviderError, StageError};
use crate::events::{
    EventSink, NoOpEventSink, PIPELINE_COMPLETED, PIPELINE_FAILED, PIPELINE_STARTED,
    STAGE_COMPLETED, STAGE_FAILED, STAGE_STARTED,
};
use crate::providers::ModelClient;
use crate::stages::{standard_stages, Stage, StageContext};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Runs documents through Parsing, Clause Extraction, NER, Clause Generation
/// and Summarization, in that order.
///
/// The pipeline is stateless between runs and can be shared across tasks.
/// Every run gets its own [`PipelineRun`]; only the model client is shared.
pub struct ContractPipeline {
    client: Arc<dyn ModelClient>,
    stages: Vec<Box<dyn Stage>>,
    config: PipelineConfig,
    sink: Arc<dyn EventSink>,
    gate: Arc<dyn StageGate>,
}

impl std::fmt::Debug for ContractPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractPipeline")
            .field("stages", &self.stages)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ContractPipeline {
    /// Creates a pipeline with the five standard stages and default config.
    #[must_use]
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            stages: standard_stages(),
            config: PipelineConfig::default(),
            sink: Arc::new(NoOpEventSink),
            gate: Arc::new(AutoProceed),
        }
    }

    /// Sets the pipeline config.
    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the sink that receives run events.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets the gate consulted between stages.
    #[must_use]
    pub fn with_gate(mut self, gate: Arc<dyn StageGate>) -> Self {
        self.gate = gate;
        self
    }

    /// The pipeline config.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The stages in execution order.
    #[must_use]
    pub fn stages(&self) -> Vec<PipelineStage> {
        self.stages.iter().map(|s| s.kind()).collect()
    }

    /// Analyzes one document.
    ///
    /// Never returns an error: a failing stage ends the run as `Failed` with
    /// the stage and cause recorded on it. Use [`PipelineRun::into_result`]
    /// to get a `Result`.
    pub async fn run(&self, document: Arc<Document>) -> PipelineRun {
        let run = PipelineRun::new(document);
        let span = tracing::info_span!("pipeline_run", run_id = %run.run_id());
        self.drive(run).instrument(span).await
    }

    /// Analyzes raw text.
    pub async fn run_text(&self, text: impl Into<String>) -> PipelineRun {
        self.run(Arc::new(Document::new(text))).await
    }

    /// Analyzes one document and combines the results into a report.
    pub async fn analyze(&self, document: Arc<Document>) -> ProcessingResponse {
        self.run(document).await.report()
    }

    async fn drive(&self, mut run: PipelineRun) -> PipelineRun {
        let run_id = run.run_id();
        let document = Arc::clone(run.document());
        let normalized = document.normalized_text();
        let started = Instant::now();

        info!(
            source = document.source_name(),
            chars = document.char_count(),
            "Pipeline started"
        );
        self.sink
            .emit(
                PIPELINE_STARTED,
                Some(json!({
                    "run_id": run_id.to_string(),
                    "source_name": document.source_name(),
                    "fingerprint": document.fingerprint(),
                    "chars": document.char_count(),
                })),
            )
            .await;

        let first = self.stages.first().map_or(PipelineStage::Parsing, |s| s.kind());
        let stage_timeout = match self
            .config
            .validate()
            .and_then(|()| self.config.stage_timeout())
        {
            Ok(timeout) => timeout,
            Err(error) => {
                let error = StageError::input(first, format!("invalid pipeline config: {error}"));
                self.fail(&mut run, first, error).await;
                return run;
            }
        };

        for (index, stage) in self.stages.iter().enumerate() {
            let kind = stage.kind();

            if index > 0 && !self.gate.should_proceed(kind, run.results()).await {
                self.fail(&mut run, kind, StageError::Declined { stage: kind })
                    .await;
                return run;
            }

            self.sink
                .emit(
                    STAGE_STARTED,
                    Some(json!({
                        "run_id": run_id.to_string(),
                        "stage": kind.name(),
                        "index": index,
                    })),
                )
                .await;

            let stage_started = Instant::now();
            let (outcome, model_calls) = {
                let ctx = StageContext::new(
                    kind,
                    run_id,
                    &document,
                    &normalized,
                    run.results(),
                    self.client.as_ref(),
                )
                .with_parsing_mode(self.config.parsing_mode);

                let span = tracing::debug_span!("stage", stage = %kind);
                let outcome = match tokio::time::timeout(stage_timeout, stage.execute(&ctx))
                    .instrument(span)
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ProviderError::timeout(stage_timeout).into()),
                };
                (outcome, ctx.model_calls())
            };

            let duration_ms = elapsed_ms(stage_started);
            run.record_timing(StageTiming {
                stage: kind,
                duration_ms,
                model_calls,
            });

            match outcome.and_then(|result| run.append(result)) {
                Ok(()) => {
                    info!(stage = %kind, duration_ms, model_calls, "Stage completed");
                    let result = run
                        .result(kind)
                        .and_then(|r| serde_json::to_value(r).ok());
                    self.sink
                        .emit(
                            STAGE_COMPLETED,
                            Some(json!({
                                "run_id": run_id.to_string(),
                                "stage": kind.name(),
                                "index": index,
                                "duration_ms": duration_ms,
                                "result": result,
                            })),
                        )
                        .await;
                }
                Err(error) => {
                    self.fail(&mut run, kind, error).await;
                    return run;
                }
            }
        }

        let duration_ms = elapsed_ms(started);
        info!(
            duration_ms,
            model_calls = run.model_calls(),
            "Pipeline completed"
        );
        self.sink
            .emit(
                PIPELINE_COMPLETED,
                Some(json!({
                    "run_id": run_id.to_string(),
                    "status": run.state(),
                    "results": run.results().len(),
                    "duration_ms": duration_ms,
                    "model_calls": run.model_calls(),
                })),
            )
            .await;
        run
    }

    async fn fail(&self, run: &mut PipelineRun, stage: PipelineStage, error: StageError) {
        let details = error.to_dict();
        warn!(stage = %stage, kind = error.kind(), "Stage failed: {error}");
        debug!(stage = %stage, details = ?details, "Stage failure details");

        let message = error.to_string();
        let completed = stage.index();
        run.fail(stage, error, self.config.failure_policy);

        let run_id = run.run_id().to_string();
        self.sink
            .emit(
                STAGE_FAILED,
                Some(json!({
                    "run_id": run_id,
                    "stage": stage.name(),
                    "index": stage.index(),
                    "error": message,
                    "details": details,
                })),
            )
            .await;
        self.sink
            .emit(
                PIPELINE_FAILED,
                Some(json!({
                    "run_id": run_id,
                    "failed_stage": stage.name(),
                    "completed": completed,
                    "results": run.results().len(),
                    "error": message,
                })),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RunState;
    use crate::providers::{MockModelClient, ModelResponse};
    use crate::testing::{sample_document, sample_replies};
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_default_stage_order() {
        let pipeline = ContractPipeline::new(Arc::new(MockModelClient::new()));
        assert_eq!(pipeline.stages(), PipelineStage::ALL.to_vec());
        assert_eq!(pipeline.config(), &PipelineConfig::default());
    }

    #[tokio::test]
    async fn test_blank_document_fails_at_parsing_without_calls() {
        let mut client = MockModelClient::new();
        client.expect_generate().never();
        let pipeline = ContractPipeline::new(Arc::new(client));

        let run = pipeline.run_text("   \n\n ").await;

        assert_eq!(run.state(), RunState::Failed);
        assert_eq!(run.failed_stage(), Some(PipelineStage::Parsing));
        assert!(run.results().is_empty());
        assert_eq!(run.model_calls(), 0);
        assert!(matches!(run.error(), Some(StageError::Input { .. })));
    }

    #[tokio::test]
    async fn test_mock_client_called_once_per_stage() {
        let mut client = MockModelClient::new();
        client
            .expect_generate()
            .times(PipelineStage::COUNT)
            .returning(|request| {
                let stage = request
                    .tag
                    .as_deref()
                    .and_then(PipelineStage::from_name)
                    .ok_or_else(|| ProviderError::malformed("untagged"))?;
                Ok(ModelResponse::text(sample_replies()[stage.index()].1))
            });
        let pipeline = ContractPipeline::new(Arc::new(client));

        let run = assert_ok!(pipeline.run(sample_document()).await.into_result());
        assert_eq!(run.state(), RunState::Done);
        assert_eq!(run.timings().iter().map(|t| t.model_calls).sum::<usize>(), 5);
    }

    #[tokio::test]
    async fn test_first_stage_failure_has_no_results() {
        let mut client = MockModelClient::new();
        client
            .expect_generate()
            .times(1)
            .returning(|_| Err(ProviderError::http(503, "unavailable")));
        let pipeline = ContractPipeline::new(Arc::new(client));

        let err = assert_err!(pipeline.run(sample_document()).await.into_result());
        assert_eq!(err.stage, PipelineStage::Parsing);
        assert!(err.partial_results.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_stage_timeout_fails_run_without_calls() {
        for seconds in [1e20, -1.0] {
            let mut client = MockModelClient::new();
            client.expect_generate().never();
            let pipeline = ContractPipeline::new(Arc::new(client))
                .with_config(PipelineConfig::new().with_stage_timeout(seconds));

            let run = pipeline.run(sample_document()).await;

            assert_eq!(run.state(), RunState::Failed);
            assert_eq!(run.failed_stage(), Some(PipelineStage::Parsing));
            assert!(run.results().is_empty());
            assert_eq!(run.model_calls(), 0);
            assert!(
                matches!(run.error(), Some(StageError::Input { reason, .. }) if reason.contains("stage_timeout_seconds"))
            );
        }
    }
}
