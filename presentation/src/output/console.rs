//! Console output formatter for pipeline results

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use serde::Serialize;
use weaver_domain::{
    AgentTask, Decision, EvaluationVerdict, IterationOutcome, NoticeLevel, PipelineResult,
    RefinementSession, Route, TaskStatus,
};

/// Formats pipeline results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete pipeline result
    pub fn format(result: &PipelineResult) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("code-weaver"));
        output.push('\n');

        output.push_str(&Self::section_header("Routing"));
        output.push_str(&Self::format_route(&result.route));

        if !result.agents_used.is_empty() {
            let used: Vec<_> = result.agents_used.iter().map(|s| s.as_str()).collect();
            output.push_str(&format!("{} {}\n", "Agents used:".cyan().bold(), used.join(", ")));
        }
        if !result.agents_skipped.is_empty() {
            output.push_str(&format!("{}\n", "Agents skipped:".cyan().bold()));
            for skipped in &result.agents_skipped {
                output.push_str(&format!(
                    "  {} {}\n",
                    skipped.slot.as_str().dimmed(),
                    skipped.reason
                ));
            }
        }

        if let Some(decomposition) = &result.decomposition {
            output.push_str(&Self::section_header("Decomposition"));
            if decomposition.planner_fallback {
                output.push_str(&format!("{}\n\n", "(planner unavailable; answered as-is)".dimmed()));
            }
            output.push_str(&decomposition.combined());
        } else if let Some(answer) = &result.explain_result {
            output.push_str(&Self::section_header("Phase A: Explanation"));
            output.push_str(answer.trim_end());
            output.push('\n');
        }

        if let Some(code) = &result.generate_result {
            output.push_str(&Self::section_header("Phase A: Generated Code"));
            output.push_str(&code.render());
        }

        if let Some(verdict) = &result.evaluation {
            output.push_str(&Self::section_header("Phase B: Evaluation"));
            output.push_str(&Self::format_evaluation(verdict));
        }

        if let Some(session) = &result.refinement {
            output.push_str(&Self::section_header("Phase C: Refinement"));
            output.push_str(&Self::format_refinement(session));
        }

        if !result.tasks.is_empty() {
            output.push_str(&Self::section_header("Agent Tasks"));
            for task in &result.tasks {
                output.push_str(&Self::format_task(task));
            }
        }

        output.push_str(&Self::format_notices(result));
        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the answer, final code and headline decisions
    pub fn format_summary(result: &PipelineResult) -> String {
        let mut output = String::new();

        if result.route.is_refusal() {
            output.push_str(&format!(
                "{} {}\n",
                "Refused:".red().bold(),
                result.route.reason()
            ));
            return output;
        }

        output.push_str(&format!(
            "{} {}\n\n",
            "Route:".dimmed(),
            Self::route_line(&result.route)
        ));

        if let Some(answer) = result.answer_text() {
            output.push_str(answer.trim_end());
            output.push_str("\n\n");
        }

        let final_code = result
            .refinement
            .as_ref()
            .and_then(|s| s.final_code())
            .or(result.generate_result.as_ref());
        if let Some(code) = final_code {
            output.push_str(&code.render());
        }

        if let Some(verdict) = &result.evaluation {
            output.push_str(&format!(
                "{} {} (score {:.1})\n",
                "Evaluation:".cyan().bold(),
                Self::decision_label(verdict.decision()),
                verdict.controller().final_score()
            ));
        }
        if let Some(session) = &result.refinement {
            output.push_str(&format!(
                "{} {}\n",
                "Tests:".cyan().bold(),
                Self::session_line(session)
            ));
        }

        output.push_str(&Self::format_notices(result));
        output
    }

    /// Format a route decision
    pub fn format_route(route: &Route) -> String {
        let mut output = format!("{} {}\n", "Route:".cyan().bold(), Self::route_line(route));
        output.push_str(&format!("{} {}\n", "Reason:".cyan().bold(), route.reason()));
        let run: Vec<_> = route.agents_to_run().iter().map(|s| s.as_str()).collect();
        let skipped: Vec<_> = route.agents_skipped().iter().map(|s| s.as_str()).collect();
        output.push_str(&format!("{} {}\n", "Runs:".cyan().bold(), Self::list(&run)));
        output.push_str(&format!("{} {}\n", "Skips:".cyan().bold(), Self::list(&skipped)));
        output
    }

    /// Format an evaluation verdict
    pub fn format_evaluation(verdict: &EvaluationVerdict) -> String {
        let mut output = String::new();
        let controller = verdict.controller();

        output.push_str(&format!(
            "{} {} (score {:.1}, confidence {:.2})\n",
            "Decision:".cyan().bold(),
            Self::decision_label(verdict.decision()),
            controller.final_score(),
            controller.confidence()
        ));
        if !controller.reasoning().is_empty() {
            output.push_str(&format!("{}\n", controller.reasoning()));
        }

        let critic = verdict.critic();
        let defender = verdict.defender();
        output.push_str(&format!(
            "\n{} {}\n",
            format!("── CRITIC ({:.1}) ──", critic.score).yellow().bold(),
            if critic.available { "" } else { "unavailable" }
        ));
        if !critic.feedback.is_empty() {
            output.push_str(&Self::indent(&critic.feedback, "  "));
            output.push('\n');
        }
        output.push_str(&format!(
            "{} {}\n",
            format!("── DEFENDER ({:.1}) ──", defender.score).yellow().bold(),
            if defender.available { "" } else { "unavailable" }
        ));
        if !defender.feedback.is_empty() {
            output.push_str(&Self::indent(&defender.feedback, "  "));
            output.push('\n');
        }

        if !controller.merged_issues().is_empty() {
            output.push_str(&format!("\n{}\n", "Issues:".yellow().bold()));
            for issue in controller.merged_issues() {
                let location = issue
                    .file
                    .as_deref()
                    .map(|f| format!(" ({})", f))
                    .unwrap_or_default();
                output.push_str(&format!(
                    "  [{}] {}{}\n",
                    issue.severity.as_str(),
                    issue.description,
                    location
                ));
            }
        }

        if !controller.priority_fixes().is_empty() {
            output.push_str(&format!("\n{}\n", "Priority fixes:".yellow().bold()));
            for fix in controller.priority_fixes() {
                output.push_str(&format!("  * {}\n", fix));
            }
        }

        if let Some(improved) = controller.improved_code_by_file() {
            let files: Vec<_> = improved.keys().map(String::as_str).collect();
            output.push_str(&format!(
                "\n{} {}\n",
                "Merged changes:".green().bold(),
                files.join(", ")
            ));
        }

        output
    }

    /// Format every iteration of a refinement session
    pub fn format_refinement(session: &RefinementSession) -> String {
        let mut output = format!("{}\n", Self::session_line(session));
        for iteration in session.iterations() {
            let outcome = match iteration.outcome() {
                IterationOutcome::Passed => "PASSED".green().bold(),
                IterationOutcome::TestsFailed => "TESTS_FAILED".red().bold(),
                IterationOutcome::ToolingError => "TOOLING_ERROR".yellow().bold(),
            };
            output.push_str(&format!(
                "  {}. {} {}\n",
                iteration.index(),
                iteration.refinement_action(),
                outcome
            ));
            for failure in iteration.failures().iter().take(5) {
                output.push_str(&format!("       {}\n", failure.dimmed()));
            }
        }
        output
    }

    fn format_task(task: &AgentTask) -> String {
        let status = match task.status() {
            TaskStatus::Done => task.status().as_str().green(),
            TaskStatus::Failed => task.status().as_str().red(),
            _ => task.status().as_str().dimmed(),
        };
        let mut line = format!(
            "  {:<14} {:<8} attempts={} {}ms\n",
            task.label,
            status,
            task.attempts(),
            task.elapsed_ms()
        );
        if let Some(error) = task.error() {
            line.push_str(&format!("                 {}\n", error.dimmed()));
        }
        line
    }

    fn format_notices(result: &PipelineResult) -> String {
        if result.notices.is_empty() {
            return String::new();
        }
        let mut output = format!("\n{}\n", "Notices:".bold());
        for notice in &result.notices {
            let marker = match notice.level {
                NoticeLevel::Info => "i".cyan(),
                NoticeLevel::Warning => "!".yellow(),
            };
            output.push_str(&format!("  {} {}\n", marker, notice.message));
        }
        output
    }

    fn route_line(route: &Route) -> String {
        match route.secondary_action() {
            Some(secondary) => format!(
                "{} + {} (confidence {:.2})",
                route.primary_action(),
                secondary,
                route.confidence()
            ),
            None => format!(
                "{} (confidence {:.2})",
                route.primary_action(),
                route.confidence()
            ),
        }
    }

    fn session_line(session: &RefinementSession) -> String {
        if session.success() {
            format!("passed after {} iteration(s)", session.total_iterations())
        } else {
            format!(
                "still failing after {} of {} iteration(s)",
                session.total_iterations(),
                session.max_iterations()
            )
        }
    }

    fn decision_label(decision: Decision) -> String {
        match decision {
            Decision::AcceptOriginal => decision.as_str().green().to_string(),
            Decision::MergeFeedback => decision.as_str().yellow().to_string(),
            Decision::RequestRevision => decision.as_str().red().to_string(),
        }
    }

    fn list(items: &[&str]) -> String {
        if items.is_empty() {
            "(none)".to_string()
        } else {
            items.join(", ")
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, result: &PipelineResult) -> String {
        Self::format(result)
    }

    fn format_json(&self, result: &PipelineResult) -> String {
        Self::format_json(result)
    }

    fn format_summary(&self, result: &PipelineResult) -> String {
        Self::format_summary(result)
    }
}
