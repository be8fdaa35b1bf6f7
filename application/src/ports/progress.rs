//! Progress notification port
//!
//! Defines the interface for reporting progress during a pipeline run.

use weaver_domain::{AgentTask, EvaluationVerdict, PipelinePhase, RefinementIteration, Route};

/// Callback for progress updates during a pipeline run
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, web UI, etc.)
pub trait PipelineProgressNotifier: Send + Sync {
    /// Called when a phase starts
    fn on_phase_start(&self, phase: PipelinePhase, total_tasks: usize);

    /// Called when an agent task reaches DONE or FAILED
    fn on_task_complete(&self, phase: PipelinePhase, task: &AgentTask);

    /// Called when a phase completes
    fn on_phase_complete(&self, phase: PipelinePhase);

    /// Called once the route is decided
    fn on_route(&self, _route: &Route) {}

    /// Called when a phase is skipped
    fn on_phase_skipped(&self, _phase: PipelinePhase, _reason: &str) {}

    /// Called when the evaluation controller reaches a decision
    fn on_evaluation(&self, _verdict: &EvaluationVerdict) {}

    /// Called after each recorded refinement iteration
    fn on_refinement_iteration(&self, _iteration: &RefinementIteration) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl PipelineProgressNotifier for NoProgress {
    fn on_phase_start(&self, _phase: PipelinePhase, _total_tasks: usize) {}
    fn on_task_complete(&self, _phase: PipelinePhase, _task: &AgentTask) {}
    fn on_phase_complete(&self, _phase: PipelinePhase) {}
}
