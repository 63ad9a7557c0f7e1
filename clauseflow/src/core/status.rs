//! Pipeline stage and run state enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the five fixed stages of a contract analysis run.
///
/// Variants are declared in execution order, so the derived `Ord` matches
/// the order in which stages run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PipelineStage {
    /// Document parsing: metadata, parties and section outline.
    Parsing,
    /// Clause extraction and classification.
    ClauseExtraction,
    /// Named entity recognition over the extracted clauses.
    #[serde(rename = "NER")]
    Ner,
    /// Improved clause wording suggestions.
    ClauseGeneration,
    /// Whole-contract summary.
    Summarization,
}

impl PipelineStage {
    /// All stages in execution order.
    pub const ALL: [Self; 5] = [
        Self::Parsing,
        Self::ClauseExtraction,
        Self::Ner,
        Self::ClauseGeneration,
        Self::Summarization,
    ];

    /// Number of stages in a complete run.
    pub const COUNT: usize = Self::ALL.len();

    /// Zero-based position of the stage in the run.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Parsing => 0,
            Self::ClauseExtraction => 1,
            Self::Ner => 2,
            Self::ClauseGeneration => 3,
            Self::Summarization => 4,
        }
    }

    /// Short identifier used in events, logs and error reports.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Parsing => "Parsing",
            Self::ClauseExtraction => "ClauseExtraction",
            Self::Ner => "NER",
            Self::ClauseGeneration => "ClauseGeneration",
            Self::Summarization => "Summarization",
        }
    }

    /// Human readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Parsing => "Document Parsing",
            Self::ClauseExtraction => "Clause Extraction",
            Self::Ner => "Named Entity Recognition",
            Self::ClauseGeneration => "Clause Generation",
            Self::Summarization => "Summarization",
        }
    }

    /// The stage that runs immediately before this one.
    #[must_use]
    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    /// The stage that runs immediately after this one.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Looks a stage up by its short identifier.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The state of a pipeline run.
///
/// A run starts in `Parsing`, moves forward one stage per successful stage
/// and ends in `Done` or `Failed`. No state is revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    /// Waiting on or executing document parsing.
    Parsing,
    /// Waiting on or executing clause extraction.
    ClauseExtraction,
    /// Waiting on or executing entity recognition.
    #[serde(rename = "NER")]
    Ner,
    /// Waiting on or executing clause generation.
    ClauseGeneration,
    /// Waiting on or executing summarization.
    Summarization,
    /// All five stages completed.
    Done,
    /// A stage failed; the run halted.
    Failed,
}

impl Default for RunState {
    fn default() -> Self {
        Self::Parsing
    }
}

impl From<PipelineStage> for RunState {
    fn from(stage: PipelineStage) -> Self {
        match stage {
            PipelineStage::Parsing => Self::Parsing,
            PipelineStage::ClauseExtraction => Self::ClauseExtraction,
            PipelineStage::Ner => Self::Ner,
            PipelineStage::ClauseGeneration => Self::ClauseGeneration,
            PipelineStage::Summarization => Self::Summarization,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage() {
            Some(stage) => f.write_str(stage.name()),
            None if *self == Self::Done => f.write_str("Done"),
            None => f.write_str("Failed"),
        }
    }
}

impl RunState {
    /// The stage this state is waiting on, if the run is still active.
    #[must_use]
    pub fn stage(self) -> Option<PipelineStage> {
        match self {
            Self::Parsing => Some(PipelineStage::Parsing),
            Self::ClauseExtraction => Some(PipelineStage::ClauseExtraction),
            Self::Ner => Some(PipelineStage::Ner),
            Self::ClauseGeneration => Some(PipelineStage::ClauseGeneration),
            Self::Summarization => Some(PipelineStage::Summarization),
            Self::Done | Self::Failed => None,
        }
    }

    /// Returns true for `Done` and `Failed`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// The state after the current stage succeeds.
    ///
    /// Terminal states are returned unchanged.
    #[must_use]
    pub fn advance(self) -> Self {
        match self.stage() {
            Some(stage) => stage.next().map_or(Self::Done, Self::from),
            None => self,
        }
    }

    /// The state after the current stage fails.
    ///
    /// Terminal states are returned unchanged.
    #[must_use]
    pub fn fail(self) -> Self {
        if self.is_terminal() {
            self
        } else {
            Self::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_matches_index() {
        for (i, stage) in PipelineStage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
        assert!(PipelineStage::Parsing < PipelineStage::Summarization);
    }

    #[test]
    fn test_stage_neighbours() {
        assert_eq!(PipelineStage::Parsing.previous(), None);
        assert_eq!(PipelineStage::Ner.previous(), Some(PipelineStage::ClauseExtraction));
        assert_eq!(PipelineStage::Ner.next(), Some(PipelineStage::ClauseGeneration));
        assert_eq!(PipelineStage::Summarization.next(), None);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineStage::Ner.to_string(), "NER");
        assert_eq!(PipelineStage::from_name("ner"), Some(PipelineStage::Ner));
        assert_eq!(PipelineStage::from_name("Summarization"), Some(PipelineStage::Summarization));
        assert_eq!(PipelineStage::from_name("classification"), None);
    }

    #[test]
    fn test_stage_serialize() {
        let json = serde_json::to_string(&PipelineStage::Ner).unwrap();
        assert_eq!(json, r#""NER""#);

        let stage: PipelineStage = serde_json::from_str(r#""ClauseGeneration""#).unwrap();
        assert_eq!(stage, PipelineStage::ClauseGeneration);
    }

    #[test]
    fn test_run_state_walks_every_stage_then_done() {
        let mut state = RunState::default();
        let mut seen = Vec::new();
        while let Some(stage) = state.stage() {
            seen.push(stage);
            state = state.advance();
        }
        assert_eq!(seen, PipelineStage::ALL.to_vec());
        assert_eq!(state, RunState::Done);
        assert_eq!(state.advance(), RunState::Done);
    }

    #[test]
    fn test_run_state_fail() {
        assert_eq!(RunState::Ner.fail(), RunState::Failed);
        assert_eq!(RunState::Done.fail(), RunState::Done);
        assert!(RunState::Failed.is_terminal());
        assert!(!RunState::Summarization.is_terminal());
    }

    #[test]
    fn test_run_state_display() {
        assert_eq!(RunState::Ner.to_string(), "NER");
        assert_eq!(RunState::Done.to_string(), "Done");
        assert_eq!(RunState::Failed.to_string(), "Failed");
    }
}
