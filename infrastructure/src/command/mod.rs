//! Command-line LLM adapter
//!
//! Implements the [`LlmGateway`](weaver_application::LlmGateway) port by
//! running a configured CLI once per prompt: the system prompt and the
//! prompt go to stdin, the answer comes back on stdout.

pub mod error;
pub mod gateway;
pub mod session;
