//! Agent domain
//!
//! - [`variant::AgentVariant`]: the closed set of agent kinds
//! - [`task::AgentTask`]: one unit of agent work and its lifecycle
//! - [`model_config::ModelConfig`]: which model backs each variant

pub mod model_config;
pub mod task;
pub mod variant;
