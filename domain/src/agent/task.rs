//! Agent task entity

use super::variant::AgentVariant;
use crate::core::model::Model;
use serde::{Deserialize, Serialize};

/// Status of an agent task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Created, not yet started
    #[default]
    Pending,
    /// Invocation in flight
    Running,
    /// Finished with a result
    Done,
    /// Finished with an error (including timeout and retry exhaustion)
    Failed,
    /// Never started because its phase was skipped
    Skipped,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Done => "DONE",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Skipped => "SKIPPED",
        }
    }

    /// A terminal status never changes again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Done | TaskStatus::Failed | TaskStatus::Skipped
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw text returned by an agent along with the model that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    pub model: Model,
    pub text: String,
}

impl AgentOutput {
    pub fn new(model: Model, text: impl Into<String>) -> Self {
        Self {
            model,
            text: text.into(),
        }
    }
}

/// A unit of agent work (Entity)
///
/// Status only moves forward: `Pending → Running → Done | Failed`, or
/// `Pending → Skipped`. Transitions out of a terminal state are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTask {
    pub variant: AgentVariant,
    /// Display label, e.g. `EXPLAIN` or `EXPLAIN#2` for a sub-question
    pub label: String,
    /// Prompt payload sent to the agent
    pub input: String,
    status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<AgentOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    attempts: u32,
    elapsed_ms: u64,
}

impl AgentTask {
    pub fn new(variant: AgentVariant, input: impl Into<String>) -> Self {
        Self {
            variant,
            label: variant.as_str().to_string(),
            input: input.into(),
            status: TaskStatus::Pending,
            output: None,
            error: None,
            attempts: 0,
            elapsed_ms: 0,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn output(&self) -> Option<&AgentOutput> {
        self.output.as_ref()
    }

    pub fn output_text(&self) -> Option<&str> {
        self.output.as_ref().map(|o| o.text.as_str())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    pub fn start(&mut self) {
        if self.status == TaskStatus::Pending {
            self.status = TaskStatus::Running;
        }
    }

    pub fn complete(&mut self, output: AgentOutput, attempts: u32, elapsed_ms: u64) {
        if self.status.is_terminal() {
            return;
        }
        self.status = TaskStatus::Done;
        self.output = Some(output);
        self.attempts = attempts;
        self.elapsed_ms = elapsed_ms;
    }

    pub fn fail(&mut self, error: impl Into<String>, attempts: u32, elapsed_ms: u64) {
        if self.status.is_terminal() {
            return;
        }
        self.status = TaskStatus::Failed;
        self.error = Some(error.into());
        self.attempts = attempts;
        self.elapsed_ms = elapsed_ms;
    }

    pub fn skip(&mut self, reason: impl Into<String>) {
        if self.status != TaskStatus::Pending {
            return;
        }
        self.status = TaskStatus::Skipped;
        self.error = Some(reason.into());
    }
}
