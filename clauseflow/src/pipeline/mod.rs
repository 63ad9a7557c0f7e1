//! Pipeline execution.
//!
//! [`ContractPipeline`] drives a document through the five stages and
//! records everything on a [`PipelineRun`]. The run's [`report`](PipelineRun::report)
//! combines the results into a single [`ProcessingResponse`].

mod driver;
mod gate;
mod report;
mod run;

#[cfg(test)]
mod integration_tests;

pub use driver::ContractPipeline;
pub use gate::{AutoProceed, ChannelGate, GateRequest, StageGate};
pub use report::{ContractReport, ProcessingResponse, ProcessingStatus};
pub use run::{PipelineRun, RunOutput, StageFailure, StageTiming};
