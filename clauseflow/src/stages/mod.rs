//! The five contract analysis stages.
//!
//! Each stage declares which earlier results it reads, builds its prompt from
//! them and the contract text, and parses the model reply into its record.

mod context;
mod extraction;
mod generation;
mod ner;
mod parsing;
mod summarization;

pub use context::StageContext;
pub use extraction::ClauseExtractionStage;
pub use generation::ClauseGenerationStage;
pub use ner::NerStage;
pub use parsing::ParsingStage;
pub use summarization::SummarizationStage;

use crate::core::PipelineStage;
use crate::errors::{StageError, StageParseError};
use crate::prompts::{PromptBuilder, StageRequest};
use crate::schemas::{SchemaHint, StageResult};
use async_trait::async_trait;
use std::fmt::Debug;

/// One step of the contract pipeline.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Which pipeline stage this is.
    fn kind(&self) -> PipelineStage;

    /// Earlier stages whose results go into the prompt, in prompt order.
    ///
    /// Every stage but the first lists the stage immediately before it.
    fn inputs(&self) -> &'static [PipelineStage];

    /// The reply shape this stage asks for.
    fn schema_hint(&self) -> SchemaHint;

    /// Turns a raw model reply into this stage's record.
    fn parse_response(&self, raw: &str) -> Result<StageResult, StageParseError>;

    /// Builds the request from the contract text and the declared inputs.
    fn build_request(&self, ctx: &StageContext<'_>) -> Result<StageRequest, StageError> {
        let kind = self.kind();
        if ctx.normalized_text().is_empty() {
            return Err(StageError::input(kind, "document has no text"));
        }

        let mut builder = PromptBuilder::new(kind).contract_text(ctx.normalized_text());
        for needed in self.inputs() {
            let result = ctx.input(*needed)?;
            builder = builder.prior_result(result).map_err(|e| {
                StageError::input(kind, format!("could not serialize '{needed}' result: {e}"))
            })?;
        }
        Ok(builder.build(self.schema_hint()))
    }

    /// Runs the stage. The default makes exactly one model call.
    async fn execute(&self, ctx: &StageContext<'_>) -> Result<StageResult, StageError> {
        run_single(self, ctx).await
    }
}

/// Builds the request, calls the model once and parses the reply.
pub async fn run_single<S>(stage: &S, ctx: &StageContext<'_>) -> Result<StageResult, StageError>
where
    S: Stage + ?Sized,
{
    let request = stage.build_request(ctx)?;
    let response = ctx.call_model(&request.to_model_request()).await?;
    Ok(stage.parse_response(&response.content)?)
}

/// The five stages in execution order.
#[must_use]
pub fn standard_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(ParsingStage),
        Box::new(ClauseExtractionStage),
        Box::new(NerStage),
        Box::new(ClauseGenerationStage),
        Box::new(SummarizationStage),
    ]
}
