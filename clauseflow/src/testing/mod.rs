//! Testing utilities for clauseflow pipelines.
//!
//! This module provides:
//! - A scripted model client with per-stage replies
//! - A sample contract and canned replies
//! - Assertions over pipeline runs

mod assertions;
mod fixtures;
mod scripted;

pub use assertions::{
    assert_done, assert_failed_at, assert_prompt_contains_result, assert_results_in_order,
};
pub use fixtures::{
    sample_document, sample_replies, scripted_except, scripted_happy_path, CLAUSE_EXTRACTION_REPLY,
    CLAUSE_GENERATION_REPLY, NER_REPLY, PARSING_REPLY, SAMPLE_CONTRACT, SUMMARIZATION_REPLY,
};
pub use scripted::ScriptedModelClient;
