//! The contract document a run operates on.

use crate::errors::ClauseflowError;
use crate::text::normalize_text;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Optional information about where a document came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// File or upload name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    /// When the document was loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Raw contract text plus optional metadata.
///
/// A `Document` is immutable once built. Runs hold it behind an `Arc`, so
/// the same document can feed several concurrent runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    text: String,
    #[serde(default)]
    metadata: DocumentMetadata,
}

impl Document {
    /// Creates a document from raw text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: DocumentMetadata::default(),
        }
    }

    /// Sets the source name.
    #[must_use]
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.source_name = Some(name.into());
        self
    }

    /// Sets the upload time.
    #[must_use]
    pub fn with_uploaded_at(mut self, at: DateTime<Utc>) -> Self {
        self.metadata.uploaded_at = Some(at);
        self
    }

    /// Loads a plain-text document from disk.
    ///
    /// The file name becomes the source name and the load time the upload time.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ClauseflowError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut document = Self::new(text).with_uploaded_at(Utc::now());
        if let Some(name) = path.file_name() {
            document = document.with_source_name(name.to_string_lossy());
        }
        Ok(document)
    }

    /// The raw text, exactly as loaded.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The document metadata.
    #[must_use]
    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    /// The source name, if known.
    #[must_use]
    pub fn source_name(&self) -> Option<&str> {
        self.metadata.source_name.as_deref()
    }

    /// The text after line-ending and whitespace normalization.
    #[must_use]
    pub fn normalized_text(&self) -> String {
        normalize_text(&self.text)
    }

    /// Hex SHA-256 of the raw text.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.text.as_bytes()))
    }

    /// Number of characters in the raw text.
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Number of non-empty paragraphs in the normalized text.
    #[must_use]
    pub fn paragraph_count(&self) -> usize {
        self.normalized_text()
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .count()
    }

    /// Returns true if the document has no visible text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_document_builders() {
        let at = Utc::now();
        let doc = Document::new("This Agreement")
            .with_source_name("nda.txt")
            .with_uploaded_at(at);

        assert_eq!(doc.text(), "This Agreement");
        assert_eq!(doc.source_name(), Some("nda.txt"));
        assert_eq!(doc.metadata().uploaded_at, Some(at));
    }

    #[test]
    fn test_fingerprint_depends_only_on_text() {
        let a = Document::new("same text").with_source_name("a.txt");
        let b = Document::new("same text").with_source_name("b.txt");
        let c = Document::new("other text");

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_paragraph_count_and_blank() {
        let doc = Document::new("First.\r\n\r\n\r\nSecond.\n\nThird.");
        assert_eq!(doc.paragraph_count(), 3);
        assert!(!doc.is_blank());
        assert!(Document::new(" \n\t ").is_blank());
    }

    #[test]
    fn test_from_path_sets_source_name() {
        let mut file = tempfile::Builder::new()
            .suffix(".txt")
            .tempfile()
            .unwrap();
        write!(file, "Termination: either party may terminate.").unwrap();

        let doc = Document::from_path(file.path()).unwrap();
        assert_eq!(doc.text(), "Termination: either party may terminate.");
        assert!(doc.source_name().unwrap().ends_with(".txt"));
        assert!(doc.metadata().uploaded_at.is_some());
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = Document::from_path("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, ClauseflowError::Io(_)));
    }
}
