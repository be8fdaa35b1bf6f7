//! Pipeline result aggregate
//!
//! Everything a presentation layer needs from one request: the route, which
//! agents ran or were skipped (and why), per-phase results, every agent
//! task, and any notices raised along the way.

use crate::agent::task::AgentTask;
use crate::code::GeneratedCode;
use crate::evaluation::EvaluationVerdict;
use crate::refinement::RefinementSession;
use crate::routing::{AgentSlot, Route};
use serde::{Deserialize, Serialize};

/// Stages of one pipeline run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Routing,
    Decompose,
    /// Phase A: EXPLAIN and GENERATE in parallel
    Answer,
    /// Phase B: CRITIC and DEFENDER, then the controller
    Evaluation,
    /// Phase C: test generation and the refinement loop
    Refinement,
}

impl PipelinePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelinePhase::Routing => "routing",
            PipelinePhase::Decompose => "decompose",
            PipelinePhase::Answer => "answer",
            PipelinePhase::Evaluation => "evaluation",
            PipelinePhase::Refinement => "refinement",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PipelinePhase::Routing => "Routing",
            PipelinePhase::Decompose => "Decompose",
            PipelinePhase::Answer => "Phase A: Explain / Generate",
            PipelinePhase::Evaluation => "Phase B: Evaluation",
            PipelinePhase::Refinement => "Phase C: Refinement",
        }
    }
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A slot that did not run, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedAgent {
    pub slot: AgentSlot,
    pub reason: String,
}

impl SkippedAgent {
    pub fn new(slot: AgentSlot, reason: impl Into<String>) -> Self {
        Self {
            slot,
            reason: reason.into(),
        }
    }
}

/// Severity of a pipeline notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Something the user should know about that did not stop the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// Answer to one planner sub-question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubAnswer {
    pub question: String,
    /// `None` when the EXPLAIN agent for this sub-question failed
    pub answer: Option<String>,
}

/// Result of the DECOMPOSE path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecompositionResult {
    /// Sub-answers in sub-question order
    pub answers: Vec<SubAnswer>,
    /// True when the planner failed and the query was answered as-is
    pub planner_fallback: bool,
}

impl DecompositionResult {
    /// Concatenate answers in sub-question order
    pub fn combined(&self) -> String {
        self.answers
            .iter()
            .enumerate()
            .map(|(i, sub)| {
                format!(
                    "## {}. {}\n\n{}\n",
                    i + 1,
                    sub.question,
                    sub.answer.as_deref().unwrap_or("(no answer: agent failed)")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn answered(&self) -> usize {
        self.answers.iter().filter(|a| a.answer.is_some()).count()
    }
}

/// Aggregate result of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub route: Route,
    /// Slots that actually ran, in execution order
    pub agents_used: Vec<AgentSlot>,
    pub agents_skipped: Vec<SkippedAgent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_result: Option<GeneratedCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decomposition: Option<DecompositionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refinement: Option<RefinementSession>,
    pub tasks: Vec<AgentTask>,
    pub notices: Vec<Notice>,
}

impl PipelineResult {
    /// Empty result for a route; phases fill in the rest.
    ///
    /// Every slot the route skipped is recorded with the route's reason.
    pub fn for_route(route: Route) -> Self {
        let agents_skipped = route
            .agents_skipped()
            .iter()
            .map(|slot| SkippedAgent::new(*slot, format!("not routed: {}", route.reason())))
            .collect();
        Self {
            route,
            agents_used: Vec::new(),
            agents_skipped,
            explain_result: None,
            generate_result: None,
            decomposition: None,
            evaluation: None,
            refinement: None,
            tasks: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn mark_used(&mut self, slot: AgentSlot) {
        if !self.agents_used.contains(&slot) {
            self.agents_used.push(slot);
            self.agents_used.sort();
        }
    }

    /// Record a skip; a slot is only ever listed once.
    pub fn mark_skipped(&mut self, slot: AgentSlot, reason: impl Into<String>) {
        if !self.agents_skipped.iter().any(|s| s.slot == slot) {
            self.agents_skipped.push(SkippedAgent::new(slot, reason));
        }
    }

    pub fn is_skipped(&self, slot: AgentSlot) -> bool {
        self.agents_skipped.iter().any(|s| s.slot == slot)
    }

    pub fn agents_skipped_names(&self) -> Vec<&'static str> {
        self.agents_skipped.iter().map(|s| s.slot.as_str()).collect()
    }

    pub fn notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Best single answer text for display
    pub fn answer_text(&self) -> Option<String> {
        self.explain_result
            .clone()
            .or_else(|| self.decomposition.as_ref().map(|d| d.combined()))
    }
}
