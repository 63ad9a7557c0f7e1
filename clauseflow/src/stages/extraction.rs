//! Clause extraction and classification stage.

use super::Stage;
use crate::core::PipelineStage;
use crate::errors::StageParseError;
use crate::schemas::{parse_list_reply, ClauseCategory, ClauseSet, SchemaHint, StageResult};
use async_trait::async_trait;

/// Extracts the contract's clauses and assigns each a category.
///
/// Clause types are rewritten to the canonical category label. Labels that
/// match no category become `Miscellaneous` with a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClauseExtractionStage;

fn classify(mut set: ClauseSet) -> ClauseSet {
    for clause in &mut set.clauses {
        let category = clause.category();
        let given = clause.clause_type.trim().to_string();
        if category == ClauseCategory::Miscellaneous && !given.eq_ignore_ascii_case(category.label()) {
            let warning = if given.is_empty() {
                "Clause type missing; classified as Miscellaneous.".to_string()
            } else {
                format!("Unrecognized clause type '{given}'; classified as Miscellaneous.")
            };
            clause.warnings.push(warning);
        }
        clause.clause_type = category.label().to_string();

        if clause.confidence.is_some_and(|c| !(0.0..=1.0).contains(&c)) {
            clause.confidence = None;
            clause.warnings.push("Confidence score out of range; dropped.".to_string());
        }
    }
    set
}

#[async_trait]
impl Stage for ClauseExtractionStage {
    fn kind(&self) -> PipelineStage {
        PipelineStage::ClauseExtraction
    }

    fn inputs(&self) -> &'static [PipelineStage] {
        &[PipelineStage::Parsing]
    }

    fn schema_hint(&self) -> SchemaHint {
        SchemaHint::json("ClauseSet", "the contract's clauses in document order").with_example(
            r#"{"clauses": [{"clause_type": "Termination & Breach", "section_name": "Termination",
 "text": "Either party may terminate this Agreement with 30 days written notice.",
 "location": "Section 9.1", "related_dates": [], "amounts": [], "confidence": 0.9, "warnings": []}]}"#,
        )
    }

    fn parse_response(&self, raw: &str) -> Result<StageResult, StageParseError> {
        let set: ClauseSet = parse_list_reply(self.kind(), raw, "clauses")?;
        if let Some(index) = set.clauses.iter().position(|c| c.text.trim().is_empty()) {
            return Err(StageParseError::new(
                self.kind(),
                format!("clause {index} has no text"),
                raw,
            ));
        }
        Ok(StageResult::ClauseExtraction(classify(set)))
    }
}
