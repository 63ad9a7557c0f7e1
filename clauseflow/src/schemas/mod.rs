//! Per-stage prompt hints and response records.
//!
//! Each stage parses the model reply into one of the records defined here.
//! Deserialization is deliberately lenient about key names and scalar types
//! because the records are filled in by a language model; shape violations
//! still fail.

mod clauses;
mod de;
mod entities;
mod hint;
mod parsing;
mod reply;
mod result;
mod suggestions;
mod summary;

pub use clauses::{Clause, ClauseCategory, ClauseSet};
pub use entities::{normalize_entity_type, Entity, EntitySet, TextSpan};
pub use hint::{ResponseFormat, SchemaHint};
pub use parsing::{ParsedDocument, Party};
pub use reply::{extract_json, fenced_body, parse_list_reply, parse_object_reply};
pub use result::StageResult;
pub use suggestions::{ClauseSuggestion, SuggestionSet};
pub use summary::{ContractSummary, RiskLevel};
