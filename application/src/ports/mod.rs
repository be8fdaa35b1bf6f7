//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod context_provider;
pub mod conversation_logger;
pub mod llm_gateway;
pub mod progress;
pub mod test_runner;
