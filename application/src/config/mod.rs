//! Application-level configuration.
//!
//! - [`ExecutionParams`]: agent timeouts, retries and loop budgets

pub mod execution_params;

pub use execution_params::ExecutionParams;
