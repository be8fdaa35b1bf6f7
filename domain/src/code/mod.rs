//! Generated code
//!
//! - [`change::CodeChange`]: replacement content for one file
//! - [`change::GeneratedCode`]: an ordered set of file changes
//! - [`parsing::parse_code_blocks`]: extracts file changes from agent text

pub mod change;
pub mod parsing;

pub use change::{CodeChange, GeneratedCode};
pub use parsing::parse_code_blocks;

/// Package name generated Rust code is built under when no manifest is supplied
pub const GENERATED_CRATE_NAME: &str = "weaver_generated";
