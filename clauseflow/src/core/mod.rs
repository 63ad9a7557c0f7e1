//! Core domain model types for clauseflow.
//!
//! This module contains:
//! - The fixed pipeline stages and the run state machine
//! - The contract document a run operates on

mod document;
mod status;

pub use document::{Document, DocumentMetadata};
pub use status::{PipelineStage, RunState};
