//! Per-variant model configuration.
//!
//! [`ModelConfig`] binds each [`AgentVariant`] to a model.
//! This is a static value object: once created, models don't change at runtime.

use super::variant::AgentVariant;
use crate::core::model::Model;
use serde::{Deserialize, Serialize};

/// Per-variant model configuration.
///
/// Classification and planning run on a cheap model by default; code
/// generation, review and arbitration use a stronger one. Critic and
/// defender default to different model families so the two reviews are
/// independent.
///
/// # Example
///
/// ```
/// use weaver_domain::{AgentVariant, Model, ModelConfig};
///
/// let config = ModelConfig::default().with_model(AgentVariant::Critic, Model::ClaudeOpus46);
/// assert_eq!(config.model_for(AgentVariant::Critic), &Model::ClaudeOpus46);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub explain: Model,
    pub generate: Model,
    pub test_gen: Model,
    pub critic: Model,
    pub defender: Model,
    pub controller: Model,
    pub classifier: Model,
    pub planner: Model,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            explain: Model::ClaudeSonnet45,
            generate: Model::ClaudeSonnet45,
            test_gen: Model::Gpt52Codex,
            critic: Model::Gpt52Codex,
            defender: Model::ClaudeSonnet45,
            controller: Model::ClaudeSonnet45,
            classifier: Model::ClaudeHaiku45,
            planner: Model::ClaudeHaiku45,
        }
    }
}

impl ModelConfig {
    /// Use one model for every variant.
    pub fn uniform(model: Model) -> Self {
        Self {
            explain: model.clone(),
            generate: model.clone(),
            test_gen: model.clone(),
            critic: model.clone(),
            defender: model.clone(),
            controller: model.clone(),
            classifier: model.clone(),
            planner: model,
        }
    }

    pub fn model_for(&self, variant: AgentVariant) -> &Model {
        match variant {
            AgentVariant::Explain => &self.explain,
            AgentVariant::Generate => &self.generate,
            AgentVariant::TestGen => &self.test_gen,
            AgentVariant::Critic => &self.critic,
            AgentVariant::Defender => &self.defender,
            AgentVariant::Controller => &self.controller,
            AgentVariant::Classifier => &self.classifier,
            AgentVariant::Planner => &self.planner,
        }
    }

    pub fn with_model(mut self, variant: AgentVariant, model: Model) -> Self {
        let slot = match variant {
            AgentVariant::Explain => &mut self.explain,
            AgentVariant::Generate => &mut self.generate,
            AgentVariant::TestGen => &mut self.test_gen,
            AgentVariant::Critic => &mut self.critic,
            AgentVariant::Defender => &mut self.defender,
            AgentVariant::Controller => &mut self.controller,
            AgentVariant::Classifier => &mut self.classifier,
            AgentVariant::Planner => &mut self.planner,
        };
        *slot = model;
        self
    }
}
