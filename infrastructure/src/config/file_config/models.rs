//! Per-agent model configuration from TOML (`[models]` section)

use serde::{Deserialize, Serialize};
use weaver_domain::{AgentVariant, ConfigIssue, ConfigIssueCode, Model, ModelConfig};

/// Per-agent model configuration from TOML
///
/// `default` applies to every agent not named explicitly; without it the
/// built-in per-agent defaults are used.
///
/// # Example
///
/// ```toml
/// [models]
/// default = "claude-sonnet-4.5"
/// critic = "gpt-5.2-codex"          # independent second opinion
/// classifier = "claude-haiku-4.5"   # cheap routing call
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    pub default: Option<String>,
    pub explain: Option<String>,
    pub generate: Option<String>,
    pub test_gen: Option<String>,
    pub critic: Option<String>,
    pub defender: Option<String>,
    pub controller: Option<String>,
    pub classifier: Option<String>,
    pub planner: Option<String>,
}

impl FileModelsConfig {
    fn field(&self, variant: AgentVariant) -> (&'static str, Option<&String>) {
        match variant {
            AgentVariant::Explain => ("explain", self.explain.as_ref()),
            AgentVariant::Generate => ("generate", self.generate.as_ref()),
            AgentVariant::TestGen => ("test_gen", self.test_gen.as_ref()),
            AgentVariant::Critic => ("critic", self.critic.as_ref()),
            AgentVariant::Defender => ("defender", self.defender.as_ref()),
            AgentVariant::Controller => ("controller", self.controller.as_ref()),
            AgentVariant::Classifier => ("classifier", self.classifier.as_ref()),
            AgentVariant::Planner => ("planner", self.planner.as_ref()),
        }
    }

    /// Parse a single model string, collecting issues for empty names.
    fn parse_single_model(field: &str, value: Option<&String>) -> (Option<Model>, Vec<ConfigIssue>) {
        match value {
            None => (None, Vec::new()),
            Some(s) if s.trim().is_empty() => (
                None,
                vec![ConfigIssue::error(
                    ConfigIssueCode::EmptyModelName {
                        field: field.to_string(),
                    },
                    format!("models.{}: model name cannot be empty", field),
                )],
            ),
            // Unknown names become Model::Custom
            Some(s) => (Some(Model::from(s.trim())), Vec::new()),
        }
    }

    /// Resolve the model for every agent variant.
    pub fn to_model_config(&self) -> (ModelConfig, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        let (default, default_issues) = Self::parse_single_model("default", self.default.as_ref());
        issues.extend(default_issues);
        let mut config = default.map(ModelConfig::uniform).unwrap_or_default();

        for variant in AgentVariant::ALL {
            let (field, value) = self.field(variant);
            let (model, field_issues) = Self::parse_single_model(field, value);
            issues.extend(field_issues);
            if let Some(model) = model {
                config = config.with_model(variant, model);
            }
        }

        (config, issues)
    }
}
