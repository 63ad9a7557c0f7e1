//! Run lifecycle events for presentation layers.
//!
//! The pipeline reports progress through an [`EventSink`] passed to it
//! explicitly. Every payload carries the run id; stage events also carry the
//! stage name and index.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// A run started.
pub const PIPELINE_STARTED: &str = "pipeline.started";
/// All five stages completed.
pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
/// A stage failed and the run halted.
pub const PIPELINE_FAILED: &str = "pipeline.failed";
/// A stage is about to call the model.
pub const STAGE_STARTED: &str = "stage.started";
/// A stage produced its result. The payload includes the result.
pub const STAGE_COMPLETED: &str = "stage.completed";
/// A stage failed.
pub const STAGE_FAILED: &str = "stage.failed";
