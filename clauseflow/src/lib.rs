//! # Clauseflow
//!
//! A staged LLM pipeline for contract analysis.
//!
//! Every document passes through five fixed stages, each one a single model
//! call whose prompt embeds the results before it:
//!
//! - **Parsing**: title, date, parties and section outline
//! - **Clause Extraction**: clauses classified into a fixed category set
//! - **NER**: parties, dates, durations, amounts and other entities
//! - **Clause Generation**: improved wording for weak clauses
//! - **Summarization**: a summary of the whole contract with a risk rating
//!
//! A run is append-only. It ends `Done` with five results, or `Failed` at the
//! first stage whose model call or reply went wrong, keeping what came before.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use clauseflow::prelude::*;
//! use std::sync::Arc;
//!
//! let client = ChatCompletionsClient::from_env()?;
//! let pipeline = ContractPipeline::new(Arc::new(client));
//!
//! let document = Arc::new(Document::from_path("agreement.txt")?);
//! let run = pipeline.run(document).await;
//! println!("{}", run.report().render_text());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod schemas;
pub mod stages;
pub mod testing;
pub mod text;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        ClauseflowConfig, FailurePolicy, ModelClientConfig, ParsingMode, PipelineConfig,
    };
    pub use crate::core::{Document, PipelineStage, RunState};
    pub use crate::errors::{
        ClauseflowError, ConfigError, PipelineError, ProviderError, StageError, StageParseError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::pipeline::{
        AutoProceed, ChannelGate, ContractPipeline, ContractReport, PipelineRun,
        ProcessingResponse, RunOutput, StageGate,
    };
    #[cfg(feature = "http")]
    pub use crate::providers::ChatCompletionsClient;
    pub use crate::providers::{ModelClient, ModelRequest, ModelResponse, RetryPolicy};
    pub use crate::schemas::{
        Clause, ClauseCategory, ClauseSet, ClauseSuggestion, ContractSummary, Entity, EntitySet,
        ParsedDocument, RiskLevel, StageResult, SuggestionSet,
    };
    pub use crate::stages::Stage;
}
