//! Prompt domain
//!
//! System prompts per agent variant and the user prompts each phase sends.

mod template;

pub use template::PromptTemplate;
