//! Route value object

use super::action::{Action, AgentSlot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The routing decision for one query (Value Object)
///
/// Constructors derive `agents_to_run` / `agents_skipped` from the actions,
/// so a route is always internally consistent:
///
/// - exactly one primary action
/// - REFUSE never runs any agent
/// - every slot is either run or skipped, never both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    primary_action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    secondary_action: Option<Action>,
    confidence: f64,
    agents_to_run: BTreeSet<AgentSlot>,
    agents_skipped: BTreeSet<AgentSlot>,
    reason: String,
}

impl Route {
    /// Build a route from classifier output.
    ///
    /// - EXPLAIN primary with a GENERATE secondary is normalized to
    ///   GENERATE primary / EXPLAIN secondary.
    /// - Any other secondary is dropped.
    /// - A REFUSE primary produces [`Route::refuse`].
    pub fn new(
        primary: Action,
        secondary: Option<Action>,
        confidence: f64,
        reason: impl Into<String>,
    ) -> Self {
        if primary == Action::Refuse {
            return Self::refuse(reason);
        }

        // Only GENERATE carries a secondary; DECOMPOSE already fans out to EXPLAIN
        let (primary, secondary) = match (primary, secondary) {
            (Action::Explain, Some(Action::Generate))
            | (Action::Generate, Some(Action::Explain)) => {
                (Action::Generate, Some(Action::Explain))
            }
            (p, _) => (p, None),
        };

        let mut to_run = BTreeSet::new();
        match primary {
            Action::Explain => {
                to_run.insert(AgentSlot::Explain);
            }
            Action::Generate => {
                to_run.extend([AgentSlot::Generate, AgentSlot::Evaluate, AgentSlot::Test]);
                if secondary == Some(Action::Explain) {
                    to_run.insert(AgentSlot::Explain);
                }
            }
            Action::Decompose => {
                to_run.extend([AgentSlot::Decompose, AgentSlot::Explain]);
            }
            Action::Refuse => {}
        }

        Self::with_slots(primary, secondary, confidence, to_run, reason.into())
    }

    /// A refusal: full confidence, nothing runs, every slot skipped.
    pub fn refuse(reason: impl Into<String>) -> Self {
        Self::with_slots(Action::Refuse, None, 1.0, BTreeSet::new(), reason.into())
    }

    /// Route used when classification is unavailable.
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self::new(Action::Explain, None, 0.0, reason)
    }

    fn with_slots(
        primary_action: Action,
        secondary_action: Option<Action>,
        confidence: f64,
        agents_to_run: BTreeSet<AgentSlot>,
        reason: String,
    ) -> Self {
        let agents_skipped = AgentSlot::ALL
            .into_iter()
            .filter(|slot| !agents_to_run.contains(slot))
            .collect();
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            primary_action,
            secondary_action,
            confidence,
            agents_to_run,
            agents_skipped,
            reason,
        }
    }

    pub fn primary_action(&self) -> Action {
        self.primary_action
    }

    pub fn secondary_action(&self) -> Option<Action> {
        self.secondary_action
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn agents_to_run(&self) -> &BTreeSet<AgentSlot> {
        &self.agents_to_run
    }

    pub fn agents_skipped(&self) -> &BTreeSet<AgentSlot> {
        &self.agents_skipped
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn runs(&self, slot: AgentSlot) -> bool {
        self.agents_to_run.contains(&slot)
    }

    pub fn is_refusal(&self) -> bool {
        self.primary_action == Action::Refuse
    }
}
