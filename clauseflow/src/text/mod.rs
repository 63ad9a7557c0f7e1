//! Text preparation for prompts.
//!
//! - Normalization of raw contract text before it is sent to the model
//! - Paragraph-aware chunking for long documents

mod chunking;
mod normalize;

pub use chunking::{chunk_text, TextChunk};
pub use normalize::normalize_text;
