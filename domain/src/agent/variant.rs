//! Agent variants

use serde::{Deserialize, Serialize};

/// The closed set of agent kinds the pipeline can invoke.
///
/// Adding an agent means adding a variant here and giving it a system prompt
/// in [`PromptTemplate::system_prompt`](crate::prompt::PromptTemplate::system_prompt)
/// and a model in [`ModelConfig`](crate::agent::model_config::ModelConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentVariant {
    /// Answers questions about the codebase
    Explain,
    /// Produces code changes
    Generate,
    /// Produces a test suite for generated code
    TestGen,
    /// Looks for defects and risk in generated code
    Critic,
    /// Assesses reasonableness and intent fidelity of generated code
    Defender,
    /// Merges critic feedback into improved code
    Controller,
    /// Judges which route a query should take
    Classifier,
    /// Splits a broad query into sub-questions
    Planner,
}

impl AgentVariant {
    pub const ALL: [AgentVariant; 8] = [
        AgentVariant::Explain,
        AgentVariant::Generate,
        AgentVariant::TestGen,
        AgentVariant::Critic,
        AgentVariant::Defender,
        AgentVariant::Controller,
        AgentVariant::Classifier,
        AgentVariant::Planner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentVariant::Explain => "EXPLAIN",
            AgentVariant::Generate => "GENERATE",
            AgentVariant::TestGen => "TEST_GEN",
            AgentVariant::Critic => "CRITIC",
            AgentVariant::Defender => "DEFENDER",
            AgentVariant::Controller => "CONTROLLER",
            AgentVariant::Classifier => "CLASSIFIER",
            AgentVariant::Planner => "PLANNER",
        }
    }

    /// Whether the variant is expected to answer with a JSON object
    pub fn returns_structured(&self) -> bool {
        matches!(
            self,
            AgentVariant::Critic
                | AgentVariant::Defender
                | AgentVariant::Controller
                | AgentVariant::Classifier
                | AgentVariant::Planner
        )
    }
}

impl std::fmt::Display for AgentVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        AgentVariant::ALL
            .into_iter()
            .find(|v| v.as_str() == normalized)
            .ok_or_else(|| format!("Unknown agent variant: {}", s))
    }
}
