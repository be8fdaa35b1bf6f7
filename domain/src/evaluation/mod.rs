//! Code evaluation domain
//!
//! Two independent reviewers score generated code: the CRITIC looks for
//! defects, the DEFENDER argues for what works. [`EvaluationPolicy`] turns
//! their typed verdicts into one [`Decision`]; the controller agent is only
//! consulted when the policy lands on MERGE_FEEDBACK.
//!
//! # Decision table (default thresholds)
//!
//! | Condition | Decision |
//! |-----------|----------|
//! | both reviewers unavailable | ACCEPT_ORIGINAL (confidence 0.0) |
//! | critic < 4 or any HIGH/CRITICAL issue | REQUEST_REVISION |
//! | critic ≥ 7 and \|critic − defender\| < 3 | ACCEPT_ORIGINAL |
//! | otherwise | MERGE_FEEDBACK |

pub mod issue;
pub mod parsing;
pub mod policy;
pub mod verdict;

pub use issue::{IssueSeverity, ReviewIssue};
pub use parsing::{
    MergeProposal, parse_controller_response, parse_critic_response, parse_defender_response,
};
pub use policy::{EvaluationPolicy, mean_score};
pub use verdict::{
    CodeChoice, ControllerVerdict, CriticVerdict, Decision, DefenderVerdict, EvaluationVerdict,
    NEUTRAL_SCORE,
};
