//! Pipeline execution settings from TOML (`[pipeline]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use weaver_application::ExecutionParams;
use weaver_domain::{ConfigIssue, ConfigIssueCode};

/// Raw pipeline configuration from TOML
///
/// The refinement loop always gets the full
/// [`MAX_REFINEMENT_ITERATIONS`](weaver_domain::MAX_REFINEMENT_ITERATIONS)
/// budget; it is not configurable.
///
/// # Example
///
/// ```toml
/// [pipeline]
/// agent_timeout_secs = 90
/// max_retries = 2
/// retry_backoff_ms = 500
/// max_subquestions = 4
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePipelineConfig {
    pub agent_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub max_subquestions: usize,
}

impl Default for FilePipelineConfig {
    fn default() -> Self {
        let params = ExecutionParams::default();
        Self {
            agent_timeout_secs: params.agent_timeout.as_secs(),
            max_retries: params.max_retries,
            retry_backoff_ms: params.retry_backoff.as_millis() as u64,
            max_subquestions: params.max_subquestions,
        }
    }
}

impl FilePipelineConfig {
    /// Convert to [`ExecutionParams`], clamping out-of-range values.
    pub fn to_execution_params(&self) -> (ExecutionParams, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let mut params = ExecutionParams::default()
            .with_max_retries(self.max_retries)
            .with_retry_backoff(Duration::from_millis(self.retry_backoff_ms))
            .with_max_subquestions(self.max_subquestions);

        if self.agent_timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidValue {
                    field: "pipeline.agent_timeout_secs".to_string(),
                    value: "0".to_string(),
                },
                "pipeline.agent_timeout_secs cannot be 0",
            ));
        } else {
            params = params.with_agent_timeout(Duration::from_secs(self.agent_timeout_secs));
        }

        if self.max_subquestions == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvalidValue {
                    field: "pipeline.max_subquestions".to_string(),
                    value: "0".to_string(),
                },
                format!(
                    "pipeline.max_subquestions must be at least 1; using {}",
                    params.max_subquestions
                ),
            ));
        }

        (params, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_execution_params() {
        let (params, issues) = FilePipelineConfig::default().to_execution_params();
        assert_eq!(params, ExecutionParams::default());
        assert!(issues.is_empty());
    }

    #[test]
    fn test_subquestion_bound_is_clamped() {
        let config = FilePipelineConfig {
            max_subquestions: 0,
            ..Default::default()
        };
        let (params, issues) = config.to_execution_params();
        assert_eq!(params.max_subquestions, 1);
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
    }

    #[test]
    fn test_zero_timeout_is_error() {
        let config = FilePipelineConfig {
            agent_timeout_secs: 0,
            ..Default::default()
        };
        let (_, issues) = config.to_execution_params();
        assert!(issues.iter().any(|i| i.is_error()));
    }
}
