//! Prompt composition.
//!
//! Every stage prompt is a list of titled sections: the stage instructions,
//! the response format, the normalized contract text and the verbatim JSON
//! of each prior result the stage depends on.

mod templates;

pub use templates::{instructions, SYSTEM_PROMPT};

use crate::core::PipelineStage;
use crate::providers::ModelRequest;
use crate::schemas::{SchemaHint, StageResult};
use serde::{Deserialize, Serialize};

/// Section title for the contract text.
pub const CONTRACT_SECTION: &str = "Contract text";

/// The fully composed input to one stage's model call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRequest {
    /// The stage the request belongs to.
    pub stage: PipelineStage,
    /// The composed user prompt.
    pub prompt: String,
    /// System instruction.
    pub system: String,
    /// Expected response shape.
    pub schema_hint: SchemaHint,
}

impl StageRequest {
    /// Converts into a model request tagged with the stage name.
    #[must_use]
    pub fn to_model_request(&self) -> ModelRequest {
        ModelRequest::new(self.prompt.clone())
            .with_system(self.system.clone())
            .with_schema_hint(self.schema_hint.clone())
            .with_tag(self.stage.name())
    }
}

/// Title used for a prior result's section.
#[must_use]
pub fn result_section_title(stage: PipelineStage) -> String {
    format!("{} result ({})", stage.label(), stage.name())
}

/// Assembles a stage prompt section by section.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    stage: PipelineStage,
    sections: Vec<(String, String)>,
}

impl PromptBuilder {
    /// Starts a prompt for the stage with its fixed instructions.
    #[must_use]
    pub fn new(stage: PipelineStage) -> Self {
        Self {
            stage,
            sections: vec![("Task".to_string(), instructions(stage))],
        }
    }

    /// Adds a titled section.
    #[must_use]
    pub fn section(mut self, title: impl Into<String>, body: impl Into<String>) -> Self {
        self.sections.push((title.into(), body.into()));
        self
    }

    /// Adds the contract text.
    #[must_use]
    pub fn contract_text(self, text: &str) -> Self {
        self.section(CONTRACT_SECTION, text)
    }

    /// Adds a prior result, serialized exactly as [`StageResult::to_prompt_context`] renders it.
    pub fn prior_result(self, result: &StageResult) -> Result<Self, serde_json::Error> {
        let body = result.to_prompt_context()?;
        Ok(self.section(result_section_title(result.stage()), body))
    }

    /// Finishes the prompt, placing the response format before the inputs.
    #[must_use]
    pub fn build(self, schema_hint: SchemaHint) -> StageRequest {
        let mut sections = self.sections.into_iter();
        let mut prompt = String::new();
        if let Some((title, body)) = sections.next() {
            push_section(&mut prompt, &title, &body);
        }
        push_section(&mut prompt, "Response format", &schema_hint.render());
        for (title, body) in sections {
            push_section(&mut prompt, &title, &body);
        }

        StageRequest {
            stage: self.stage,
            prompt: prompt.trim_end().to_string(),
            system: SYSTEM_PROMPT.to_string(),
            schema_hint,
        }
    }
}

fn push_section(prompt: &mut String, title: &str, body: &str) {
    prompt.push_str("## ");
    prompt.push_str(title);
    prompt.push('\n');
    prompt.push_str(body.trim_end());
    prompt.push_str("\n\n");
}
