//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted to domain/application types
//! through `to_*` methods that also report [`ConfigIssue`]s.

mod evaluation;
mod gateway;
mod logging;
mod models;
mod output;
mod pipeline;
mod router;
mod test_runner;

pub use evaluation::FileEvaluationConfig;
pub use gateway::FileGatewayConfig;
pub use logging::FileLoggingConfig;
pub use models::FileModelsConfig;
pub use output::FileOutputConfig;
pub use pipeline::FilePipelineConfig;
pub use router::FileRouterConfig;
pub use test_runner::FileTestRunnerConfig;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use weaver_domain::ConfigIssue;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("invalid configuration:\n{}", join_messages(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn join_messages(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("  - {}", i.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Per-agent model selection
    pub models: FileModelsConfig,
    /// Timeouts, retries and loop bounds
    pub pipeline: FilePipelineConfig,
    /// Evaluation controller thresholds
    pub evaluation: FileEvaluationConfig,
    /// Extra unsafe-intent patterns
    pub router: FileRouterConfig,
    /// LLM command
    pub gateway: FileGatewayConfig,
    /// Test command
    pub test_runner: FileTestRunnerConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Transcript and log file locations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// This is the single entry point for config validation.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.models.to_model_config().1);
        issues.extend(self.pipeline.to_execution_params().1);
        issues.extend(self.evaluation.to_policy().1);
        issues.extend(self.router.to_safety_gate().1);
        issues.extend(self.gateway.validate());
        issues.extend(self.test_runner.validate());
        issues
    }

    /// Fail on any error-level issue; otherwise return the warnings.
    pub fn check(&self) -> Result<Vec<ConfigIssue>, ConfigValidationError> {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            self.validate().into_iter().partition(|i| i.is_error());
        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(ConfigValidationError::Invalid(errors))
        }
    }
}
