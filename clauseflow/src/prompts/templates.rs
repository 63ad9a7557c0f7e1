//! Fixed per-stage instruction text.

use crate::core::PipelineStage;
use crate::schemas::ClauseCategory;

/// System instruction shared by every stage.
pub const SYSTEM_PROMPT: &str = "You are a meticulous legal contract analyst. \
Work only from the contract text and the prior results you are given. \
Never invent parties, dates or amounts. \
When something is missing or ambiguous, say so in a warning instead of guessing.";

const PARSING: &str = "\
Read the contract and extract its metadata.
- contract_title: the full title exactly as written.
- contract_date: the effective or signing date as written; null if absent.
- parties_involved: every party with its party_name and role (for example Client, Service Provider).
- sections: the section headings in document order.
- warnings: one entry per missing, incomplete or ambiguous item, for example a missing contract date or inconsistent section numbering.
If the text is not a contract at all, reply with {\"status\": \"failed\", \"error\": \"<reason>\"}.";

const NER: &str = "\
Find the named entities in the extracted clauses.
Use these entity types: PARTY, DATE, DURATION, MONEY, PERCENTAGE, JURISDICTION, OBLIGATION.
- value: the entity text as written in the clause, for example \"30 days\" or \"$50,000\".
- clause_index: zero-based index of the clause in the ClauseExtraction result.
- role: for PARTY entities, the party's role; otherwise null.
- span: optional {start, end} character offsets inside the clause text.
Keep relative periods such as notice periods as DURATION entities; do not convert them to dates.";

const GENERATION: &str = "\
Suggest clearer, more robust wording for the extracted clauses.
For each clause that can be improved:
- keep its legal intent and category;
- make vague terms explicit and define key terms;
- flag references to other sections that are not reproduced.
Use the recognized entities to keep parties, dates, durations and amounts consistent.
For a clause that needs no change, repeat it unchanged and explain why in modification_reason.";

const SUMMARIZATION: &str = "\
Write a concise summary of the contract using every prior result.
Cover: the contract type and purpose; the parties and their roles; the main financial terms; \
critical dates, durations and notice periods; core obligations; termination and dispute terms.
Then assess the overall risk as low, medium or high and list vague, one-sided or risky terms in flagged_terms.";

fn clause_extraction() -> String {
    let categories = ClauseCategory::ALL
        .iter()
        .map(|c| format!("  - {}", c.label()))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "\
Extract every clause of the contract, in document order, and classify it.
- clause_type: exactly one of these categories, chosen by the clause's primary function:
{categories}
  If unsure, use Miscellaneous and add a warning.
- section_name: the heading the clause sits under.
- text: the complete clause text, not truncated.
- location: where the clause appears, for example \"Section 4.2\".
- related_dates and amounts: every date and monetary amount the clause mentions, as written.
- confidence: a number between 0 and 1.
- warnings: possible truncation, overlapping categories or references to missing sections."
    )
}

/// The instruction block for a stage.
#[must_use]
pub fn instructions(stage: PipelineStage) -> String {
    match stage {
        PipelineStage::Parsing => PARSING.to_string(),
        PipelineStage::ClauseExtraction => clause_extraction(),
        PipelineStage::Ner => NER.to_string(),
        PipelineStage::ClauseGeneration => GENERATION.to_string(),
        PipelineStage::Summarization => SUMMARIZATION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_stage_has_instructions() {
        for stage in PipelineStage::ALL {
            assert!(!instructions(stage).trim().is_empty(), "{stage}");
        }
    }

    #[test]
    fn test_extraction_lists_all_categories() {
        let text = instructions(PipelineStage::ClauseExtraction);
        for category in ClauseCategory::ALL {
            assert!(text.contains(category.label()));
        }
    }
}
