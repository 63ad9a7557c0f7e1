//! Clause improvement records.

use super::de;
use serde::{Deserialize, Serialize};

/// A proposed rewording of one clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseSuggestion {
    /// Category of the clause being improved.
    #[serde(default, alias = "clause_type", alias = "category", deserialize_with = "de::text")]
    pub clause_category: String,
    /// The clause as written.
    #[serde(default, alias = "original_text", deserialize_with = "de::text")]
    pub original_clause_text: String,
    /// The proposed wording.
    #[serde(alias = "improved_text", alias = "suggested_text", deserialize_with = "de::text")]
    pub improved_clause_text: String,
    /// Why the change was made, or why none was needed.
    #[serde(default, alias = "reason", deserialize_with = "de::text")]
    pub modification_reason: String,
}

impl ClauseSuggestion {
    /// Returns true if the suggestion actually changes the wording.
    #[must_use]
    pub fn is_change(&self) -> bool {
        self.original_clause_text.trim() != self.improved_clause_text.trim()
    }
}

/// Suggestions produced by the ClauseGeneration stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionSet {
    /// One entry per clause the model chose to address.
    #[serde(alias = "clauses")]
    pub suggestions: Vec<ClauseSuggestion>,
}

impl SuggestionSet {
    /// Suggestions that change the wording.
    pub fn changes(&self) -> impl Iterator<Item = &ClauseSuggestion> {
        self.suggestions.iter().filter(|s| s.is_change())
    }
}
