//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: available AI models (Claude, GPT, Gemini, etc.)
//! - [`query::Query`]: an immutable, validated request entering the pipeline
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
pub mod query;
