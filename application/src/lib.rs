//! Application layer for code-weaver
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::ExecutionParams;
pub use ports::{
    context_provider::{ContextError, ContextProvider, NoContext},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{GatewayError, LlmGateway, LlmSession},
    progress::{NoProgress, PipelineProgressNotifier},
    test_runner::{TestRunner, TestRunnerError},
};
pub use use_cases::evaluate_code::{EvaluateCodeUseCase, EvaluationRun};
pub use use_cases::invoke_agent::AgentInvoker;
pub use use_cases::refine_code::{RefineCodeUseCase, RefineError, RefinementRun};
pub use use_cases::route_query::RouteQueryUseCase;
pub use use_cases::run_pipeline::{PipelineError, RunPipelineUseCase};
pub use use_cases::shared::RequestContext;
