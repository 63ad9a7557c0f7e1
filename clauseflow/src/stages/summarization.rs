//! Summarization stage.

use super::Stage;
use crate::core::PipelineStage;
use crate::errors::StageParseError;
use crate::schemas::{fenced_body, parse_object_reply, ContractSummary, SchemaHint, StageResult};
use async_trait::async_trait;

/// Writes the whole-contract summary from every earlier result.
///
/// Accepts either the requested JSON object or a plain-text summary, fenced
/// or not.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummarizationStage;

#[async_trait]
impl Stage for SummarizationStage {
    fn kind(&self) -> PipelineStage {
        PipelineStage::Summarization
    }

    fn inputs(&self) -> &'static [PipelineStage] {
        &[
            PipelineStage::Parsing,
            PipelineStage::ClauseExtraction,
            PipelineStage::Ner,
            PipelineStage::ClauseGeneration,
        ]
    }

    fn schema_hint(&self) -> SchemaHint {
        SchemaHint::json("ContractSummary", "a concise summary with a risk rating").with_example(
            r#"{"summary": "A 12-month services agreement between ...", "risk_level": "medium",
 "flagged_terms": ["Liability cap is undefined"]}"#,
        )
    }

    fn parse_response(&self, raw: &str) -> Result<StageResult, StageParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(StageParseError::new(self.kind(), "empty reply", raw));
        }

        let fenced = trimmed.starts_with("```").then(|| fenced_body(trimmed)).flatten();
        let summary = match fenced {
            Some(body) if !body.starts_with('{') => ContractSummary::new(body),
            Some(_) => parse_object_reply::<ContractSummary>(self.kind(), raw)?,
            None if trimmed.starts_with('{') => {
                parse_object_reply::<ContractSummary>(self.kind(), raw)?
            }
            None => ContractSummary::new(trimmed),
        };

        if summary.summary.trim().is_empty() {
            return Err(StageParseError::new(self.kind(), "summary is empty", raw));
        }
        Ok(StageResult::Summarization(summary))
    }
}
