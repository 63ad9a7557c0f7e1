//! Response-shape hints passed to the model client.

use serde::{Deserialize, Serialize};

/// What kind of reply a stage expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// A single JSON object.
    Json,
    /// Free text.
    Text,
}

/// Describes the reply a stage expects.
///
/// The hint is rendered into the prompt and also handed to the model client,
/// which may use it to request a structured response mode from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaHint {
    /// Record name, e.g. `ParsedDocument`.
    pub name: String,
    /// Expected reply format.
    pub format: ResponseFormat,
    /// One-sentence description of the record.
    pub description: String,
    /// An example reply, embedded in the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

impl SchemaHint {
    /// Creates a hint for a JSON object reply.
    #[must_use]
    pub fn json(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format: ResponseFormat::Json,
            description: description.into(),
            example: None,
        }
    }

    /// Creates a hint for a free-text reply.
    #[must_use]
    pub fn text(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format: ResponseFormat::Text,
            description: description.into(),
            example: None,
        }
    }

    /// Sets the example reply.
    #[must_use]
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// Returns true if the stage expects a JSON object.
    #[must_use]
    pub fn expects_json(&self) -> bool {
        self.format == ResponseFormat::Json
    }

    /// Renders the hint as prompt text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = match self.format {
            ResponseFormat::Json => format!(
                "Respond with a single JSON object ({}): {}\nDo not wrap the JSON in markdown and do not add commentary.",
                self.name, self.description
            ),
            ResponseFormat::Text => format!("Respond with plain text ({}): {}", self.name, self.description),
        };
        if let Some(example) = &self.example {
            out.push_str("\nExample:\n");
            out.push_str(example);
        }
        out
    }
}
