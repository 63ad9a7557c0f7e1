//! Sample contract and canned stage replies.

use crate::core::{Document, PipelineStage};
use std::sync::Arc;

use super::ScriptedModelClient;

/// A short services agreement with a 30-day termination clause.
pub const SAMPLE_CONTRACT: &str = "MASTER SERVICES AGREEMENT\r\n\
\r\n\
This Agreement is made on January 15, 2025 between Acme Corp (\"Provider\") and Globex LLC (\"Client\").\r\n\
\r\n\
\r\n\
Payment: Client shall pay Provider $5,000 per month within 15 days of invoice.\r\n\
\r\n\
Termination: either party may terminate with 30 days notice.\r\n\
\r\n\
Confidentiality: each party shall keep the other's confidential information secret for 2 years.\r\n";

/// Parsing reply for [`SAMPLE_CONTRACT`].
pub const PARSING_REPLY: &str = r#"{
  "contract_title": "Master Services Agreement",
  "contract_date": "2025-01-15",
  "parties_involved": [
    {"party_name": "Acme Corp", "role": "Provider"},
    {"party_name": "Globex LLC", "role": "Client"}
  ],
  "sections": ["Payment", "Termination", "Confidentiality"]
}"#;

/// Clause extraction reply for [`SAMPLE_CONTRACT`].
pub const CLAUSE_EXTRACTION_REPLY: &str = r#"```json
{"clauses": [
  {"clause_type": "Financial Terms", "section_name": "Payment",
   "text": "Client shall pay Provider $5,000 per month within 15 days of invoice.",
   "amounts": ["$5,000"], "related_dates": ["15 days"], "confidence": 0.95},
  {"clause_type": "Termination & Breach", "section_name": "Termination",
   "text": "Either party may terminate with 30 days notice.", "confidence": 0.9},
  {"clause_type": "Confidentiality & NDA", "section_name": "Confidentiality",
   "text": "Each party shall keep the other's confidential information secret for 2 years.",
   "confidence": 0.9}
]}
```"#;

/// NER reply for [`SAMPLE_CONTRACT`], including the `DURATION` entity `30 days`.
pub const NER_REPLY: &str = r#"{"entities": [
  {"entity_type": "PARTY", "value": "Acme Corp", "role": "Provider"},
  {"entity_type": "PARTY", "value": "Globex LLC", "role": "Client"},
  {"entity_type": "MONEY", "value": "$5,000", "clause_index": 0},
  {"entity_type": "DURATION", "value": "30 days", "clause_index": 1},
  {"entity_type": "DURATION", "value": "2 years", "clause_index": 2}
]}"#;

/// Clause generation reply for [`SAMPLE_CONTRACT`].
pub const CLAUSE_GENERATION_REPLY: &str = r#"{"suggestions": [
  {"clause_category": "Termination & Breach",
   "original_clause_text": "Either party may terminate with 30 days notice.",
   "improved_clause_text": "Either party may terminate this Agreement for convenience by giving 30 days' written notice to the other party.",
   "modification_reason": "Specifies the form of notice."}
]}"#;

/// Summarization reply for [`SAMPLE_CONTRACT`].
pub const SUMMARIZATION_REPLY: &str = r#"{
  "summary": "Acme Corp provides services to Globex LLC for $5,000 per month. Either party may terminate on 30 days notice; confidentiality lasts 2 years.",
  "risk_level": "low",
  "flagged_terms": ["30 days notice"]
}"#;

/// The canned reply for each stage, in stage order.
#[must_use]
pub fn sample_replies() -> [(PipelineStage, &'static str); PipelineStage::COUNT] {
    [
        (PipelineStage::Parsing, PARSING_REPLY),
        (PipelineStage::ClauseExtraction, CLAUSE_EXTRACTION_REPLY),
        (PipelineStage::Ner, NER_REPLY),
        (PipelineStage::ClauseGeneration, CLAUSE_GENERATION_REPLY),
        (PipelineStage::Summarization, SUMMARIZATION_REPLY),
    ]
}

/// A scripted client answering every stage with its sample reply.
#[must_use]
pub fn scripted_happy_path() -> ScriptedModelClient {
    sample_replies()
        .into_iter()
        .fold(ScriptedModelClient::new(), |client, (stage, reply)| {
            client.reply(stage, reply)
        })
}

/// Like [`scripted_happy_path`] but with no script for `stage`, so the
/// caller can queue a failure or a bad reply for it.
#[must_use]
pub fn scripted_except(stage: PipelineStage) -> ScriptedModelClient {
    sample_replies()
        .into_iter()
        .filter(|(kind, _)| *kind != stage)
        .fold(ScriptedModelClient::new(), |client, (kind, reply)| {
            client.reply(kind, reply)
        })
}

/// [`SAMPLE_CONTRACT`] as a shareable document.
#[must_use]
pub fn sample_document() -> Arc<Document> {
    Arc::new(Document::new(SAMPLE_CONTRACT).with_source_name("services-agreement.txt"))
}
