//! Reviewer and controller verdicts

use super::issue::ReviewIssue;
use crate::code::GeneratedCode;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// CRITIC review of generated code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticVerdict {
    /// 0-10
    pub score: f64,
    pub issues: Vec<ReviewIssue>,
    pub feedback: String,
    pub suggested_changes: Vec<String>,
    /// False when the score is the neutral default for a failed reviewer
    pub available: bool,
}

impl CriticVerdict {
    pub fn new(score: f64, issues: Vec<ReviewIssue>, feedback: impl Into<String>) -> Self {
        Self {
            score: clamp_score(score),
            issues,
            feedback: feedback.into(),
            suggested_changes: Vec::new(),
            available: true,
        }
    }

    pub fn with_suggested_changes(mut self, changes: Vec<String>) -> Self {
        self.suggested_changes = changes;
        self
    }

    /// Neutral verdict for a critic that failed or timed out
    pub fn unavailable(cause: &str) -> Self {
        Self {
            score: NEUTRAL_SCORE,
            issues: vec![ReviewIssue::reviewer_unavailable("CRITIC", cause)],
            feedback: String::new(),
            suggested_changes: Vec::new(),
            available: false,
        }
    }

    pub fn has_blocking_issue(&self) -> bool {
        self.issues.iter().any(|i| i.severity.is_blocking())
    }
}

/// DEFENDER review of generated code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefenderVerdict {
    pub score: f64,
    pub feedback: String,
    pub available: bool,
}

impl DefenderVerdict {
    pub fn new(score: f64, feedback: impl Into<String>) -> Self {
        Self {
            score: clamp_score(score),
            feedback: feedback.into(),
            available: true,
        }
    }

    /// Neutral verdict for a defender that failed or timed out
    pub fn unavailable(cause: &str) -> Self {
        Self {
            score: NEUTRAL_SCORE,
            feedback: format!("DEFENDER reviewer unavailable: {}", cause),
            available: false,
        }
    }
}

/// Score substituted for a reviewer that did not answer
pub const NEUTRAL_SCORE: f64 = 5.0;

pub(crate) fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 10.0)
    } else {
        NEUTRAL_SCORE
    }
}

/// Outcome of the evaluation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    AcceptOriginal,
    MergeFeedback,
    RequestRevision,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::AcceptOriginal => "ACCEPT_ORIGINAL",
            Decision::MergeFeedback => "MERGE_FEEDBACK",
            Decision::RequestRevision => "REQUEST_REVISION",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Arbitrated decision over the two reviews (Value Object)
///
/// `improved_code_by_file` is present exactly when the decision is
/// MERGE_FEEDBACK; [`ControllerVerdict::new`] refuses any other shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerVerdict {
    decision: Decision,
    reasoning: String,
    final_score: f64,
    confidence: f64,
    merged_issues: Vec<ReviewIssue>,
    priority_fixes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    improved_code_by_file: Option<BTreeMap<String, String>>,
}

impl ControllerVerdict {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        decision: Decision,
        reasoning: impl Into<String>,
        final_score: f64,
        confidence: f64,
        merged_issues: Vec<ReviewIssue>,
        priority_fixes: Vec<String>,
        improved_code_by_file: Option<BTreeMap<String, String>>,
    ) -> Result<Self, DomainError> {
        if (decision == Decision::MergeFeedback) != improved_code_by_file.is_some() {
            return Err(DomainError::ImprovedCodeWithoutMerge);
        }
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Ok(Self {
            decision,
            reasoning: reasoning.into(),
            final_score: clamp_score(final_score),
            confidence,
            merged_issues,
            priority_fixes,
            improved_code_by_file,
        })
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn final_score(&self) -> f64 {
        self.final_score
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn merged_issues(&self) -> &[ReviewIssue] {
        &self.merged_issues
    }

    pub fn priority_fixes(&self) -> &[String] {
        &self.priority_fixes
    }

    pub fn improved_code_by_file(&self) -> Option<&BTreeMap<String, String>> {
        self.improved_code_by_file.as_ref()
    }
}

/// Which code a caller wants out of an [`EvaluationVerdict`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeChoice {
    Original,
    /// Controller-merged code when available, otherwise the original
    #[default]
    Improved,
}

/// Full result of the evaluation phase (Value Object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationVerdict {
    critic: CriticVerdict,
    defender: DefenderVerdict,
    controller: ControllerVerdict,
    original: GeneratedCode,
    notices: Vec<String>,
}

impl EvaluationVerdict {
    pub fn new(
        critic: CriticVerdict,
        defender: DefenderVerdict,
        controller: ControllerVerdict,
        original: GeneratedCode,
        notices: Vec<String>,
    ) -> Self {
        Self {
            critic,
            defender,
            controller,
            original,
            notices,
        }
    }

    pub fn critic(&self) -> &CriticVerdict {
        &self.critic
    }

    pub fn defender(&self) -> &DefenderVerdict {
        &self.defender
    }

    pub fn controller(&self) -> &ControllerVerdict {
        &self.controller
    }

    pub fn decision(&self) -> Decision {
        self.controller.decision
    }

    pub fn original(&self) -> &GeneratedCode {
        &self.original
    }

    /// Reviewer-availability notices
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn selected_code(&self, choice: CodeChoice) -> GeneratedCode {
        match (choice, &self.controller.improved_code_by_file) {
            (CodeChoice::Improved, Some(improved)) => self.original.with_replacements(improved),
            _ => self.original.clone(),
        }
    }
}
