//! Progress reporting for pipeline execution

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;
use weaver_application::PipelineProgressNotifier;
use weaver_domain::{
    AgentTask, EvaluationVerdict, IterationOutcome, PipelinePhase, RefinementIteration, Route,
    TaskStatus,
};

/// Reports progress during a pipeline run with progress bars
pub struct ProgressReporter {
    multi: MultiProgress,
    phase_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            phase_bar: Mutex::new(None),
        }
    }

    fn phase_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn println(&self, line: String) {
        // Falls back to stderr when the terminal is hidden
        if self.multi.println(&line).is_err() {
            eprintln!("{}", line);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineProgressNotifier for ProgressReporter {
    fn on_phase_start(&self, phase: PipelinePhase, total_tasks: usize) {
        let pb = self.multi.add(ProgressBar::new(total_tasks as u64));
        pb.set_style(Self::phase_style());
        pb.set_prefix(phase.display_name());
        pb.set_message("Starting...");

        if let Ok(mut slot) = self.phase_bar.lock()
            && let Some(previous) = slot.replace(pb)
        {
            previous.finish_and_clear();
        }
    }

    fn on_task_complete(&self, _phase: PipelinePhase, task: &AgentTask) {
        if let Ok(slot) = self.phase_bar.lock()
            && let Some(pb) = slot.as_ref()
        {
            let status = match task.status() {
                TaskStatus::Done => format!("{} {}", "v".green(), task.label),
                _ => format!("{} {}", "x".red(), task.label),
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_phase_complete(&self, phase: PipelinePhase) {
        if let Ok(mut slot) = self.phase_bar.lock()
            && let Some(pb) = slot.take()
        {
            pb.finish_with_message(format!("{} complete!", phase.as_str().green()));
        }
    }

    fn on_route(&self, route: &Route) {
        self.println(format!(
            "{} {} ({:.2})",
            "->".cyan(),
            route.primary_action().as_str().bold(),
            route.confidence()
        ));
    }

    fn on_phase_skipped(&self, phase: PipelinePhase, reason: &str) {
        self.println(format!(
            "{} {} skipped: {}",
            "-".dimmed(),
            phase.display_name(),
            reason
        ));
    }

    fn on_evaluation(&self, verdict: &EvaluationVerdict) {
        self.println(format!(
            "{} {} (score {:.1})",
            "->".cyan(),
            verdict.decision().as_str().bold(),
            verdict.controller().final_score()
        ));
    }

    fn on_refinement_iteration(&self, iteration: &RefinementIteration) {
        if let Ok(slot) = self.phase_bar.lock()
            && let Some(pb) = slot.as_ref()
        {
            pb.set_message(format!(
                "iteration {}: {}",
                iteration.index(),
                iteration.outcome().as_str()
            ));
            pb.inc(1);
        }
    }
}

/// Simple text-based progress (no fancy UI), written to stderr
pub struct SimpleProgress;

impl PipelineProgressNotifier for SimpleProgress {
    fn on_phase_start(&self, phase: PipelinePhase, total_tasks: usize) {
        eprintln!(
            "{} {} ({} tasks)",
            "->".cyan(),
            phase.display_name().bold(),
            total_tasks
        );
    }

    fn on_task_complete(&self, _phase: PipelinePhase, task: &AgentTask) {
        match task.status() {
            TaskStatus::Done => eprintln!("  {} {}", "v".green(), task.label),
            _ => eprintln!(
                "  {} {} (failed: {})",
                "x".red(),
                task.label,
                task.error().unwrap_or("unknown")
            ),
        }
    }

    fn on_phase_complete(&self, _phase: PipelinePhase) {
        eprintln!();
    }

    fn on_phase_skipped(&self, phase: PipelinePhase, reason: &str) {
        eprintln!("{} {} skipped: {}", "-".dimmed(), phase.display_name(), reason);
    }

    fn on_refinement_iteration(&self, iteration: &RefinementIteration) {
        let outcome = match iteration.outcome() {
            IterationOutcome::Passed => "passed".green(),
            IterationOutcome::TestsFailed => "failed".red(),
            IterationOutcome::ToolingError => "tooling error".yellow(),
        };
        eprintln!("  iteration {}: {}", iteration.index(), outcome);
    }
}
