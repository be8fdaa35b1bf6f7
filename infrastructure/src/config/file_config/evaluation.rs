//! Evaluation thresholds from TOML (`[evaluation]` section)

use serde::{Deserialize, Serialize};
use weaver_domain::{ConfigIssue, ConfigIssueCode, EvaluationPolicy};

/// Raw evaluation thresholds from TOML
///
/// # Example
///
/// ```toml
/// [evaluation]
/// accept_min_score = 8.0
/// revise_below_score = 5.0
/// disagreement_threshold = 2.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEvaluationConfig {
    pub accept_min_score: f64,
    pub revise_below_score: f64,
    pub disagreement_threshold: f64,
}

impl Default for FileEvaluationConfig {
    fn default() -> Self {
        let policy = EvaluationPolicy::default();
        Self {
            accept_min_score: policy.accept_min_score,
            revise_below_score: policy.revise_below_score,
            disagreement_threshold: policy.disagreement_threshold,
        }
    }
}

impl FileEvaluationConfig {
    /// Convert to an [`EvaluationPolicy`]; an inconsistent policy is an
    /// error and the defaults are returned.
    pub fn to_policy(&self) -> (EvaluationPolicy, Vec<ConfigIssue>) {
        let policy = EvaluationPolicy {
            accept_min_score: self.accept_min_score,
            revise_below_score: self.revise_below_score,
            disagreement_threshold: self.disagreement_threshold,
        };
        match policy.validate() {
            Ok(()) => (policy, Vec::new()),
            Err(e) => (
                EvaluationPolicy::default(),
                vec![ConfigIssue::error(
                    ConfigIssueCode::InvalidValue {
                        field: "evaluation".to_string(),
                        value: format!(
                            "accept={}, revise={}, disagreement={}",
                            self.accept_min_score,
                            self.revise_below_score,
                            self.disagreement_threshold
                        ),
                    },
                    format!("[evaluation]: {}", e),
                )],
            ),
        }
    }
}
