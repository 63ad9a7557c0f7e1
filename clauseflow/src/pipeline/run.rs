//! The record of one pipeline run.

use super::report::{ContractReport, ProcessingResponse};
use crate::config::FailurePolicy;
use crate::core::{Document, PipelineStage, RunState};
use crate::errors::{PipelineError, StageError};
use crate::schemas::StageResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Wall-clock cost of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTiming {
    /// The stage.
    pub stage: PipelineStage,
    /// Elapsed time in milliseconds.
    pub duration_ms: u64,
    /// Model calls the stage made.
    pub model_calls: usize,
}

/// The stage a run failed at, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    /// The failing stage.
    pub stage: PipelineStage,
    /// What went wrong.
    pub error: StageError,
}

/// The deterministic part of a run: status and results, no ids or timings.
///
/// Two runs over the same document with the same replies serialize to the
/// same JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    /// `Done` or `Failed`.
    pub status: RunState,
    /// The failing stage, for failed runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<PipelineStage>,
    /// The failure message, for failed runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Results in stage order.
    pub results: Vec<StageResult>,
}

impl RunOutput {
    /// Pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One document's pass through the pipeline.
///
/// Results are append-only and always in stage order. A `Done` run holds
/// exactly five results; a `Failed` run holds the results of the stages that
/// completed before the failure (none under [`FailurePolicy::DiscardPartial`]).
#[derive(Debug, Clone)]
pub struct PipelineRun {
    run_id: Uuid,
    document: Arc<Document>,
    state: RunState,
    results: Vec<StageResult>,
    failure: Option<StageFailure>,
    timings: Vec<StageTiming>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl PipelineRun {
    /// Starts a run in the `Parsing` state.
    #[must_use]
    pub fn new(document: Arc<Document>) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            document,
            state: RunState::default(),
            results: Vec::with_capacity(PipelineStage::COUNT),
            failure: None,
            timings: Vec::with_capacity(PipelineStage::COUNT),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// The run id.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// The analyzed document.
    #[must_use]
    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Returns true if all stages completed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == RunState::Done
    }

    /// Returns true if a stage failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.state == RunState::Failed
    }

    /// Results in stage order.
    #[must_use]
    pub fn results(&self) -> &[StageResult] {
        &self.results
    }

    /// The result of one stage, if it completed.
    #[must_use]
    pub fn result(&self, stage: PipelineStage) -> Option<&StageResult> {
        self.results.iter().find(|r| r.stage() == stage)
    }

    /// The failure, for failed runs.
    #[must_use]
    pub fn failure(&self) -> Option<&StageFailure> {
        self.failure.as_ref()
    }

    /// The failing stage, for failed runs.
    #[must_use]
    pub fn failed_stage(&self) -> Option<PipelineStage> {
        self.failure.as_ref().map(|f| f.stage)
    }

    /// The failure cause, for failed runs.
    #[must_use]
    pub fn error(&self) -> Option<&StageError> {
        self.failure.as_ref().map(|f| &f.error)
    }

    /// Per-stage timings, including the failing stage.
    #[must_use]
    pub fn timings(&self) -> &[StageTiming] {
        &self.timings
    }

    /// When the run started.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the run reached `Done` or `Failed`.
    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Total model calls across all stages.
    #[must_use]
    pub fn model_calls(&self) -> usize {
        self.timings.iter().map(|t| t.model_calls).sum()
    }

    /// Appends the result of the stage the run is waiting on and advances.
    ///
    /// A result for any other stage, or a result after the run finished, is
    /// returned as an input error and the run is left unchanged.
    pub(crate) fn append(&mut self, result: StageResult) -> Result<(), StageError> {
        let expected = self.state.stage().ok_or_else(|| {
            StageError::input(result.stage(), format!("run is already {}", self.state))
        })?;
        if result.stage() != expected {
            return Err(StageError::input(
                expected,
                format!("stage produced a '{}' result", result.stage()),
            ));
        }
        self.results.push(result);
        self.state = self.state.advance();
        if self.state.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        Ok(())
    }

    pub(crate) fn record_timing(&mut self, timing: StageTiming) {
        self.timings.push(timing);
    }

    /// Halts the run at `stage`.
    pub(crate) fn fail(&mut self, stage: PipelineStage, error: StageError, policy: FailurePolicy) {
        if self.state.is_terminal() {
            return;
        }
        self.state = self.state.fail();
        self.failure = Some(StageFailure { stage, error });
        if policy == FailurePolicy::DiscardPartial {
            self.results.clear();
        }
        self.finished_at = Some(Utc::now());
    }

    /// The deterministic view of the run.
    #[must_use]
    pub fn output(&self) -> RunOutput {
        RunOutput {
            status: self.state,
            failed_stage: self.failed_stage(),
            error: self.error().map(ToString::to_string),
            results: self.results.clone(),
        }
    }

    /// Converts a failed run into an error carrying its partial results.
    pub fn into_result(mut self) -> Result<Self, PipelineError> {
        match self.failure.take() {
            Some(StageFailure { stage, error }) => {
                Err(PipelineError::new(stage, error, self.results))
            }
            None => Ok(self),
        }
    }

    /// Combines all results into the contract report envelope.
    #[must_use]
    pub fn report(&self) -> ProcessingResponse {
        let document = (!self.results.is_empty())
            .then(|| ContractReport::from_results(self.document.source_name(), &self.results));
        match &self.failure {
            None => ProcessingResponse::success(document),
            Some(failure) => ProcessingResponse::error(failure.error.to_string(), document),
        }
    }
}
