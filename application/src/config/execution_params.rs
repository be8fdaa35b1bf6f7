//! Execution parameters: agent invocation and loop control.
//!
//! [`ExecutionParams`] groups the static parameters that control how agents
//! are invoked (timeout, retry) and how far the decomposition fan-out may go.
//! These are application-layer concerns, not domain policy; evaluation
//! thresholds live in [`EvaluationPolicy`](weaver_domain::EvaluationPolicy)
//! and the refinement budget is fixed at
//! [`MAX_REFINEMENT_ITERATIONS`](weaver_domain::MAX_REFINEMENT_ITERATIONS).

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Per-invocation timeout; a timed-out attempt counts as a failure.
    pub agent_timeout: Duration,
    /// Retries after the first attempt. `0` disables retry.
    pub max_retries: u32,
    /// Backoff before the first retry; doubles for each further retry.
    pub retry_backoff: Duration,
    /// Upper bound on planner sub-questions.
    pub max_subquestions: usize,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            agent_timeout: Duration::from_secs(120),
            max_retries: 1,
            retry_backoff: Duration::from_millis(250),
            max_subquestions: 5,
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_max_subquestions(mut self, max: usize) -> Self {
        self.max_subquestions = max.max(1);
        self
    }

    // ==================== Derived Values ====================

    /// Total attempts per invocation, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Backoff before retry number `retry` (1-based): `base * 2^(retry - 1)`.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.retry_backoff.saturating_mul(1 << exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = ExecutionParams::default();
        assert_eq!(params.max_retries, 1);
        assert_eq!(params.max_attempts(), 2);
        assert_eq!(params.retry_backoff, Duration::from_millis(250));
        assert_eq!(params.max_subquestions, 5);
    }

    #[test]
    fn test_builder_clamps() {
        let params = ExecutionParams::default()
            .with_max_subquestions(0)
            .with_max_retries(0);

        assert_eq!(params.max_subquestions, 1);
        assert_eq!(params.max_attempts(), 1);
    }

    #[test]
    fn test_exponential_backoff() {
        let params = ExecutionParams::default();
        assert_eq!(params.backoff_for(1), Duration::from_millis(250));
        assert_eq!(params.backoff_for(2), Duration::from_millis(500));
        assert_eq!(params.backoff_for(3), Duration::from_millis(1000));
    }
}
