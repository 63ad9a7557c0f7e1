//! Named entity recognition stage.

use super::Stage;
use crate::core::PipelineStage;
use crate::errors::StageParseError;
use crate::schemas::{parse_list_reply, EntitySet, SchemaHint, StageResult};
use async_trait::async_trait;

/// Finds parties, dates, durations, amounts and similar entities in the clauses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NerStage;

#[async_trait]
impl Stage for NerStage {
    fn kind(&self) -> PipelineStage {
        PipelineStage::Ner
    }

    fn inputs(&self) -> &'static [PipelineStage] {
        &[PipelineStage::ClauseExtraction]
    }

    fn schema_hint(&self) -> SchemaHint {
        SchemaHint::json("EntitySet", "entities found in the extracted clauses").with_example(
            r#"{"entities": [{"entity_type": "DURATION", "value": "30 days", "clause_index": 0, "role": null}]}"#,
        )
    }

    fn parse_response(&self, raw: &str) -> Result<StageResult, StageParseError> {
        let set: EntitySet = parse_list_reply(self.kind(), raw, "entities")?;
        if let Some(index) = set
            .entities
            .iter()
            .position(|e| e.entity_type.is_empty() || e.value.trim().is_empty())
        {
            return Err(StageParseError::new(
                self.kind(),
                format!("entity {index} is missing a type or value"),
                raw,
            ));
        }
        Ok(StageResult::Ner(set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entities() {
        let raw = r#"{"entities": [
            {"entity_type": "duration", "value": "30 days", "clause_index": 0},
            {"type": "PARTY", "text": "Acme Corp", "role": "Client"}
        ]}"#;
        let result = NerStage.parse_response(raw).unwrap();
        let set = result.as_entities().unwrap();

        assert_eq!(set.find("DURATION", "30 days").unwrap().clause_index, Some(0));
        assert_eq!(set.of_type("PARTY").next().unwrap().role.as_deref(), Some("Client"));
    }

    #[test]
    fn test_rejects_blank_entity() {
        let raw = r#"{"entities": [{"entity_type": "DATE", "value": ""}]}"#;
        let err = NerStage.parse_response(raw).unwrap_err();
        assert_eq!(err.stage, PipelineStage::Ner);
        assert!(err.reason.contains("entity 0"));
    }

    #[test]
    fn test_rejects_missing_list() {
        assert!(NerStage.parse_response(r#"{"summary": "no entities"}"#).is_err());
    }
}
