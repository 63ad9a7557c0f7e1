//! Test assertions for pipeline runs.

use crate::core::{PipelineStage, RunState};
use crate::pipeline::PipelineRun;

/// Asserts that the run completed every stage.
pub fn assert_done(run: &PipelineRun) {
    assert!(
        run.is_done(),
        "Expected Done, got {} (error: {:?})",
        run.state(),
        run.error().map(ToString::to_string)
    );
    assert_eq!(run.results().len(), PipelineStage::COUNT);
    assert_results_in_order(run);
}

/// Asserts that the run failed at the stage with the given number of results.
pub fn assert_failed_at(run: &PipelineRun, stage: PipelineStage, results: usize) {
    assert_eq!(run.state(), RunState::Failed, "Expected Failed, got {}", run.state());
    assert_eq!(run.failed_stage(), Some(stage));
    assert_eq!(
        run.results().len(),
        results,
        "Expected {results} result(s) before failing at {stage}"
    );
    assert!(run.result(stage).is_none(), "Failing stage {stage} has a result");
    assert_results_in_order(run);
}

/// Asserts that results appear in stage order with no gaps.
pub fn assert_results_in_order(run: &PipelineRun) {
    let stages: Vec<PipelineStage> = run.results().iter().map(|r| r.stage()).collect();
    assert_eq!(stages, PipelineStage::ALL[..stages.len()].to_vec());
}

/// Asserts that the prompt embeds the run's result for `stage` verbatim.
pub fn assert_prompt_contains_result(prompt: &str, run: &PipelineRun, stage: PipelineStage) {
    let result = run
        .result(stage)
        .unwrap_or_else(|| panic!("Run has no {stage} result"));
    let rendered = result
        .to_prompt_context()
        .unwrap_or_else(|e| panic!("Could not render {stage} result: {e}"));
    assert!(
        prompt.contains(&rendered),
        "Prompt does not contain the {stage} result verbatim:\n{rendered}"
    );
}
