//! Infrastructure layer for code-weaver
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod command;
pub mod config;
pub mod context;
pub mod logging;
pub mod test_runner;

// Re-export commonly used types
pub use command::{
    error::CommandGatewayError,
    gateway::{CommandLlmGateway, CommandSpec},
    session::CommandSession,
};
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileEvaluationConfig, FileGatewayConfig,
    FileLoggingConfig, FileModelsConfig, FileOutputConfig, FilePipelineConfig, FileRouterConfig,
    FileTestRunnerConfig,
};
pub use context::LocalContextProvider;
pub use logging::JsonlConversationLogger;
pub use test_runner::{ProcessTestRunner, extract_failures};
