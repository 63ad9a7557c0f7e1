//! Clause generation stage.

use super::Stage;
use crate::core::PipelineStage;
use crate::errors::StageParseError;
use crate::schemas::{parse_list_reply, SchemaHint, StageResult, SuggestionSet};
use async_trait::async_trait;

/// Proposes improved wording for the extracted clauses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClauseGenerationStage;

#[async_trait]
impl Stage for ClauseGenerationStage {
    fn kind(&self) -> PipelineStage {
        PipelineStage::ClauseGeneration
    }

    fn inputs(&self) -> &'static [PipelineStage] {
        &[PipelineStage::ClauseExtraction, PipelineStage::Ner]
    }

    fn schema_hint(&self) -> SchemaHint {
        SchemaHint::json("SuggestionSet", "improved wording, one entry per clause addressed").with_example(
            r#"{"suggestions": [{"clause_category": "Termination & Breach",
 "original_clause_text": "Either party may terminate this Agreement.",
 "improved_clause_text": "Either party may terminate this Agreement by giving 30 days written notice.",
 "modification_reason": "States the notice period explicitly."}]}"#,
        )
    }

    fn parse_response(&self, raw: &str) -> Result<StageResult, StageParseError> {
        let set: SuggestionSet = parse_list_reply(self.kind(), raw, "suggestions")?;
        if let Some(index) = set
            .suggestions
            .iter()
            .position(|s| s.improved_clause_text.trim().is_empty())
        {
            return Err(StageParseError::new(
                self.kind(),
                format!("suggestion {index} has no improved text"),
                raw,
            ));
        }
        Ok(StageResult::ClauseGeneration(set))
    }
}
