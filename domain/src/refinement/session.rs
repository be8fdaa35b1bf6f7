//! Refinement session entity

use super::MAX_REFINEMENT_ITERATIONS;
use super::iteration::RefinementIteration;
use crate::code::GeneratedCode;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Ordered refinement iterations for one request (Entity)
///
/// `record` is the only way in, and it enforces:
///
/// - indices are 1, 2, 3, ... with no gaps
/// - at most [`MAX_REFINEMENT_ITERATIONS`]
/// - nothing is recorded after a passing iteration
///
/// so `success` can simply read the last iteration, and a finished session
/// without success always holds exactly [`MAX_REFINEMENT_ITERATIONS`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefinementSession {
    iterations: Vec<RefinementIteration>,
}

impl RefinementSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, iteration: RefinementIteration) -> Result<(), DomainError> {
        if self.success() {
            return Err(DomainError::SessionFinished);
        }
        if self.iterations.len() >= MAX_REFINEMENT_ITERATIONS {
            return Err(DomainError::IterationBudgetExceeded {
                max: MAX_REFINEMENT_ITERATIONS,
            });
        }
        let expected = self.iterations.len() + 1;
        if iteration.index() != expected {
            return Err(DomainError::IterationOutOfOrder {
                expected,
                got: iteration.index(),
            });
        }
        self.iterations.push(iteration);
        Ok(())
    }

    /// Index the next recorded iteration must carry
    pub fn next_index(&self) -> usize {
        self.iterations.len() + 1
    }

    /// No further iterations can be recorded
    pub fn is_finished(&self) -> bool {
        self.success() || self.iterations.len() >= MAX_REFINEMENT_ITERATIONS
    }

    pub fn success(&self) -> bool {
        self.iterations.last().is_some_and(|i| i.tests_passed())
    }

    pub fn total_iterations(&self) -> usize {
        self.iterations.len()
    }

    pub fn max_iterations(&self) -> usize {
        MAX_REFINEMENT_ITERATIONS
    }

    pub fn iterations(&self) -> &[RefinementIteration] {
        &self.iterations
    }

    pub fn last(&self) -> Option<&RefinementIteration> {
        self.iterations.last()
    }

    /// Code from the last iteration
    pub fn final_code(&self) -> Option<&GeneratedCode> {
        self.iterations.last().map(|i| i.code())
    }

    /// Tests from the last iteration
    pub fn final_tests(&self) -> Option<&GeneratedCode> {
        self.iterations.last().map(|i| i.tests())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::CodeChange;
    use crate::refinement::iteration::TestRun;

    fn iteration(index: usize, passed: bool) -> RefinementIteration {
        let code = GeneratedCode::new([CodeChange::new("src/lib.rs", format!("v{}", index))]);
        let run = if passed {
            TestRun::passed("ok")
        } else {
            TestRun::failed("fail", vec!["t FAILED".to_string()])
        };
        RefinementIteration::from_test_run(index, code, GeneratedCode::default(), "", run)
    }

    #[test]
    fn test_fail_fail_pass() {
        let mut session = RefinementSession::default();
        session.record(iteration(1, false)).unwrap();
        session.record(iteration(2, false)).unwrap();
        assert!(!session.is_finished());
        session.record(iteration(3, true)).unwrap();

        assert!(session.success());
        assert!(session.is_finished());
        assert_eq!(session.total_iterations(), 3);
        assert_eq!(session.final_code().and_then(|c| c.get("src/lib.rs")), Some("v3"));
    }

    #[test]
    fn test_budget_enforced() {
        let mut session = RefinementSession::default();
        for i in 1..=4 {
            session.record(iteration(i, false)).unwrap();
        }
        assert!(session.is_finished());
        assert!(!session.success());
        assert_eq!(
            session.record(iteration(5, true)),
            Err(DomainError::IterationBudgetExceeded { max: 4 })
        );
        assert_eq!(session.total_iterations(), 4);
    }

    #[test]
    fn test_no_record_after_pass() {
        let mut session = RefinementSession::default();
        session.record(iteration(1, true)).unwrap();
        assert_eq!(
            session.record(iteration(2, false)),
            Err(DomainError::SessionFinished)
        );
    }

    #[test]
    fn test_out_of_order() {
        let mut session = RefinementSession::default();
        assert_eq!(
            session.record(iteration(2, false)),
            Err(DomainError::IterationOutOfOrder { expected: 1, got: 2 })
        );
    }

    #[test]
    fn test_unsuccessful_finish_uses_full_budget() {
        let mut session = RefinementSession::new();
        assert_eq!(session.max_iterations(), MAX_REFINEMENT_ITERATIONS);
        assert!(session.final_code().is_none());

        for i in 1..MAX_REFINEMENT_ITERATIONS {
            session.record(iteration(i, false)).unwrap();
            assert!(!session.is_finished());
        }
        session
            .record(iteration(MAX_REFINEMENT_ITERATIONS, false))
            .unwrap();
        assert!(session.is_finished());
        assert!(!session.success());
        assert_eq!(session.total_iterations(), MAX_REFINEMENT_ITERATIONS);
    }
}
