//! Document parsing stage.

use super::{run_single, Stage, StageContext};
use crate::config::ParsingMode;
use crate::core::PipelineStage;
use crate::errors::{StageError, StageParseError};
use crate::prompts::PromptBuilder;
use crate::schemas::{parse_object_reply, ParsedDocument, SchemaHint, StageResult};
use crate::text::chunk_text;
use async_trait::async_trait;

const NO_METADATA_WARNING: &str = "No contract metadata found; manual review needed.";

/// Extracts title, date, parties and section outline.
///
/// In [`ParsingMode::Chunked`] the document is parsed one chunk at a time and
/// the partial results are merged in chunk order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParsingStage;

impl ParsingStage {
    fn parse_document(raw: &str) -> Result<ParsedDocument, StageParseError> {
        parse_object_reply(PipelineStage::Parsing, raw)
    }

    async fn execute_chunked(
        &self,
        ctx: &StageContext<'_>,
        chunk_size: usize,
        overlap: usize,
    ) -> Result<StageResult, StageError> {
        let chunks = chunk_text(ctx.normalized_text(), chunk_size, overlap);
        if chunks.len() <= 1 {
            return run_single(self, ctx).await;
        }

        let total = chunks.len();
        tracing::info!(chunks = total, chunk_size, overlap, "Parsing document in chunks");

        let mut merged = ParsedDocument::default();
        for chunk in &chunks {
            let request = PromptBuilder::new(PipelineStage::Parsing)
                .section(
                    "Chunk",
                    format!(
                        "This is chunk {} of {total} (characters {} to {}). Extract only what this chunk shows.",
                        chunk.sequence + 1,
                        chunk.start,
                        chunk.end
                    ),
                )
                .contract_text(&chunk.text)
                .build(self.schema_hint());
            let response = ctx.call_model(&request.to_model_request()).await?;
            merged.merge(Self::parse_document(&response.content)?);
        }

        Ok(StageResult::Parsing(finish(merged)))
    }
}

fn finish(mut document: ParsedDocument) -> ParsedDocument {
    if document.is_empty() && document.warnings.is_empty() {
        document.warnings.push(NO_METADATA_WARNING.to_string());
    }
    document
}

#[async_trait]
impl Stage for ParsingStage {
    fn kind(&self) -> PipelineStage {
        PipelineStage::Parsing
    }

    fn inputs(&self) -> &'static [PipelineStage] {
        &[]
    }

    fn schema_hint(&self) -> SchemaHint {
        SchemaHint::json("ParsedDocument", "contract metadata and section outline").with_example(
            r#"{"contract_title": "Master Services Agreement", "contract_date": "2025-01-15",
 "parties_involved": [{"party_name": "Acme Corp", "role": "Client"}],
 "sections": ["Services", "Payment", "Termination"], "warnings": []}"#,
        )
    }

    fn parse_response(&self, raw: &str) -> Result<StageResult, StageParseError> {
        Ok(StageResult::Parsing(finish(Self::parse_document(raw)?)))
    }

    async fn execute(&self, ctx: &StageContext<'_>) -> Result<StageResult, StageError> {
        match ctx.parsing_mode() {
            ParsingMode::Whole => run_single(self, ctx).await,
            ParsingMode::Chunked { chunk_size, overlap } => {
                if ctx.normalized_text().is_empty() {
                    return Err(StageError::input(PipelineStage::Parsing, "document has no text"));
                }
                self.execute_chunked(ctx, chunk_size, overlap).await
            }
        }
    }
}
