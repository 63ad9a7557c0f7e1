//! Paragraph-aware chunking with overlap.

use serde::{Deserialize, Serialize};

/// A contiguous slice of a document, cut on paragraph boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// The chunk text, paragraphs joined by a blank line.
    pub text: String,
    /// Character offset of the chunk start in the source text.
    pub start: usize,
    /// Character offset one past the chunk end in the source text.
    pub end: usize,
    /// Zero-based chunk number.
    pub sequence: usize,
}

#[derive(Debug, Clone, Copy)]
struct Paragraph<'a> {
    text: &'a str,
    offset: usize,
    chars: usize,
}

impl Paragraph<'_> {
    fn end(&self) -> usize {
        self.offset + self.chars
    }
}

fn paragraphs(text: &str) -> Vec<Paragraph<'_>> {
    let mut result = Vec::new();
    let mut offset = 0;
    for part in text.split("\n\n") {
        let chars = part.chars().count();
        if !part.trim().is_empty() {
            result.push(Paragraph {
                text: part,
                offset,
                chars,
            });
        }
        offset += chars + 2;
    }
    result
}

fn emit(group: &[Paragraph<'_>], sequence: usize) -> Option<TextChunk> {
    let first = group.first()?;
    let last = group.last()?;
    let text = group
        .iter()
        .map(|p| p.text)
        .collect::<Vec<_>>()
        .join("\n\n");
    Some(TextChunk {
        text,
        start: first.offset,
        end: last.end(),
        sequence,
    })
}

/// Splits text into chunks of roughly `chunk_size` characters.
///
/// Chunks break only between paragraphs (blank-line separated). When a new
/// chunk starts, trailing paragraphs of the previous chunk whose combined
/// length fits in `overlap` are repeated at its head. A single paragraph
/// longer than `chunk_size` becomes its own chunk rather than being cut.
#[must_use]
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<TextChunk> {
    let mut chunks = Vec::new();
    let mut current: Vec<Paragraph<'_>> = Vec::new();
    let mut current_size = 0;

    for paragraph in paragraphs(text) {
        if current_size + paragraph.chars > chunk_size && !current.is_empty() {
            chunks.extend(emit(&current, chunks.len()));

            let mut carried = Vec::new();
            let mut carried_size = 0;
            for previous in current.iter().rev() {
                if carried_size + previous.chars > overlap {
                    break;
                }
                carried_size += previous.chars;
                carried.push(*previous);
            }
            carried.reverse();

            current = carried;
            current.push(paragraph);
            current_size = current.iter().map(|p| p.chars).sum();
        } else {
            current_size += paragraph.chars;
            current.push(paragraph);
        }
    }

    chunks.extend(emit(&current, chunks.len()));
    chunks
}
