//! Evaluation decision policy

use super::issue::ReviewIssue;
use super::verdict::{ControllerVerdict, CriticVerdict, Decision, DefenderVerdict};
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Thresholds that turn two reviewer scores into a [`Decision`].
///
/// # Example
///
/// ```
/// use weaver_domain::{CriticVerdict, Decision, DefenderVerdict, EvaluationPolicy};
///
/// let policy = EvaluationPolicy::default();
/// let critic = CriticVerdict::new(8.0, vec![], "clean");
/// let defender = DefenderVerdict::new(9.0, "solid");
/// assert_eq!(policy.decide(&critic, &defender), Decision::AcceptOriginal);
/// assert_eq!(policy.confidence(&critic, &defender), 0.9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationPolicy {
    /// Critic score at or above which the original is accepted
    pub accept_min_score: f64,
    /// Critic score below which a revision is requested
    pub revise_below_score: f64,
    /// Reviewer score gap at or above which the reviewers are considered to disagree
    pub disagreement_threshold: f64,
}

impl Default for EvaluationPolicy {
    fn default() -> Self {
        Self {
            accept_min_score: 7.0,
            revise_below_score: 4.0,
            disagreement_threshold: 3.0,
        }
    }
}

impl EvaluationPolicy {
    pub fn validate(&self) -> Result<(), DomainError> {
        let in_range = |v: f64| (0.0..=10.0).contains(&v);
        if !in_range(self.accept_min_score) || !in_range(self.revise_below_score) {
            return Err(DomainError::InvalidPolicy(
                "scores must be within 0..=10".to_string(),
            ));
        }
        if self.revise_below_score > self.accept_min_score {
            return Err(DomainError::InvalidPolicy(format!(
                "revise_below_score ({}) exceeds accept_min_score ({})",
                self.revise_below_score, self.accept_min_score
            )));
        }
        if !(self.disagreement_threshold > 0.0 && self.disagreement_threshold <= 10.0) {
            return Err(DomainError::InvalidPolicy(
                "disagreement_threshold must be within (0, 10]".to_string(),
            ));
        }
        Ok(())
    }

    /// Decide what happens to the generated code.
    ///
    /// Rules are checked in order; the first match wins.
    pub fn decide(&self, critic: &CriticVerdict, defender: &DefenderVerdict) -> Decision {
        if !critic.available && !defender.available {
            return Decision::AcceptOriginal;
        }
        if critic.score < self.revise_below_score || critic.has_blocking_issue() {
            return Decision::RequestRevision;
        }
        if critic.score >= self.accept_min_score && !self.disagree(critic, defender) {
            return Decision::AcceptOriginal;
        }
        Decision::MergeFeedback
    }

    fn disagree(&self, critic: &CriticVerdict, defender: &DefenderVerdict) -> bool {
        (critic.score - defender.score).abs() >= self.disagreement_threshold
    }

    /// Agreement between the reviewers: `1 - |critic - defender| / 10`.
    ///
    /// Zero when neither reviewer answered.
    pub fn confidence(&self, critic: &CriticVerdict, defender: &DefenderVerdict) -> f64 {
        if !critic.available && !defender.available {
            return 0.0;
        }
        (1.0 - (critic.score - defender.score).abs() / 10.0).clamp(0.0, 1.0)
    }

    /// Critic issues plus a placeholder for an unavailable defender.
    pub fn merged_issues(critic: &CriticVerdict, defender: &DefenderVerdict) -> Vec<ReviewIssue> {
        let mut issues = critic.issues.clone();
        if !defender.available {
            issues.push(ReviewIssue::reviewer_unavailable(
                "DEFENDER",
                defender
                    .feedback
                    .strip_prefix("DEFENDER reviewer unavailable: ")
                    .unwrap_or(&defender.feedback),
            ));
        }
        issues
    }

    /// Blocking issues first, then the critic's suggested changes.
    pub fn priority_fixes(critic: &CriticVerdict) -> Vec<String> {
        critic
            .issues
            .iter()
            .filter(|i| i.severity.is_blocking())
            .map(|i| i.to_string())
            .chain(critic.suggested_changes.iter().cloned())
            .collect()
    }

    /// Build the verdict for a decision that needs no controller agent
    /// (ACCEPT_ORIGINAL or REQUEST_REVISION).
    pub fn settle(
        &self,
        decision: Decision,
        critic: &CriticVerdict,
        defender: &DefenderVerdict,
    ) -> Result<ControllerVerdict, DomainError> {
        let reasoning = match decision {
            Decision::AcceptOriginal if !critic.available && !defender.available => {
                "Both reviewers unavailable; accepting the original code unverified".to_string()
            }
            Decision::AcceptOriginal => format!(
                "Critic score {:.1} meets the acceptance threshold and reviewers agree (defender {:.1})",
                critic.score, defender.score
            ),
            Decision::RequestRevision if critic.has_blocking_issue() => format!(
                "Critic reported blocking issues (score {:.1})",
                critic.score
            ),
            Decision::RequestRevision => format!(
                "Critic score {:.1} is below the revision threshold {:.1}",
                critic.score, self.revise_below_score
            ),
            Decision::MergeFeedback => {
                return Err(DomainError::ImprovedCodeWithoutMerge);
            }
        };

        ControllerVerdict::new(
            decision,
            reasoning,
            mean_score(critic, defender),
            self.confidence(critic, defender),
            Self::merged_issues(critic, defender),
            Self::priority_fixes(critic),
            None,
        )
    }
}

/// Mean of the two reviewer scores (unavailable reviewers count as neutral)
pub fn mean_score(critic: &CriticVerdict, defender: &DefenderVerdict) -> f64 {
    (critic.score + defender.score) / 2.0
}
