//! The typed result of one stage.

use super::{ClauseSet, ContractSummary, EntitySet, ParsedDocument, SuggestionSet};
use crate::core::PipelineStage;
use serde::{Deserialize, Serialize};

/// The structured record one stage produced.
///
/// Serializes as `{"stage": "NER", "result": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "result")]
pub enum StageResult {
    /// Output of document parsing.
    Parsing(ParsedDocument),
    /// Output of clause extraction.
    ClauseExtraction(ClauseSet),
    /// Output of entity recognition.
    #[serde(rename = "NER")]
    Ner(EntitySet),
    /// Output of clause generation.
    ClauseGeneration(SuggestionSet),
    /// Output of summarization.
    Summarization(ContractSummary),
}

impl StageResult {
    /// The stage that produced this result.
    #[must_use]
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::Parsing(_) => PipelineStage::Parsing,
            Self::ClauseExtraction(_) => PipelineStage::ClauseExtraction,
            Self::Ner(_) => PipelineStage::Ner,
            Self::ClauseGeneration(_) => PipelineStage::ClauseGeneration,
            Self::Summarization(_) => PipelineStage::Summarization,
        }
    }

    /// The record serialized as pretty JSON, as it is embedded in later prompts.
    pub fn to_prompt_context(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Parsing(r) => serde_json::to_string_pretty(r),
            Self::ClauseExtraction(r) => serde_json::to_string_pretty(r),
            Self::Ner(r) => serde_json::to_string_pretty(r),
            Self::ClauseGeneration(r) => serde_json::to_string_pretty(r),
            Self::Summarization(r) => serde_json::to_string_pretty(r),
        }
    }

    /// The parsed document, if this is a Parsing result.
    #[must_use]
    pub fn as_parsed(&self) -> Option<&ParsedDocument> {
        match self {
            Self::Parsing(r) => Some(r),
            _ => None,
        }
    }

    /// The clauses, if this is a ClauseExtraction result.
    #[must_use]
    pub fn as_clauses(&self) -> Option<&ClauseSet> {
        match self {
            Self::ClauseExtraction(r) => Some(r),
            _ => None,
        }
    }

    /// The entities, if this is an NER result.
    #[must_use]
    pub fn as_entities(&self) -> Option<&EntitySet> {
        match self {
            Self::Ner(r) => Some(r),
            _ => None,
        }
    }

    /// The suggestions, if this is a ClauseGeneration result.
    #[must_use]
    pub fn as_suggestions(&self) -> Option<&SuggestionSet> {
        match self {
            Self::ClauseGeneration(r) => Some(r),
            _ => None,
        }
    }

    /// The summary, if this is a Summarization result.
    #[must_use]
    pub fn as_summary(&self) -> Option<&ContractSummary> {
        match self {
            Self::Summarization(r) => Some(r),
            _ => None,
        }
    }
}
