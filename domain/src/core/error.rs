//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Refinement budget of {max} iterations exhausted")]
    IterationBudgetExceeded { max: usize },

    #[error("Refinement session already finished")]
    SessionFinished,

    #[error("Iteration index {got} out of order (expected {expected})")]
    IterationOutOfOrder { expected: usize, got: usize },

    #[error("Improved code is only valid for a MERGE_FEEDBACK decision")]
    ImprovedCodeWithoutMerge,

    #[error("Invalid evaluation policy: {0}")]
    InvalidPolicy(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::SessionFinished.is_cancelled());
        assert!(!DomainError::InvalidQuery("empty".to_string()).is_cancelled());
    }

    #[test]
    fn test_budget_message() {
        let error = DomainError::IterationBudgetExceeded { max: 4 };
        assert_eq!(
            error.to_string(),
            "Refinement budget of 4 iterations exhausted"
        );
    }
}
