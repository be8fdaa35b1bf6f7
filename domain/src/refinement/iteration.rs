//! Refinement iteration value objects

use crate::code::GeneratedCode;
use serde::{Deserialize, Serialize};

/// Result of running generated tests against generated code
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestRun {
    pub passed: bool,
    /// Raw runner output (stdout and stderr)
    pub output: String,
    /// Failure lines extracted from the output
    pub failures: Vec<String>,
}

impl TestRun {
    pub fn passed(output: impl Into<String>) -> Self {
        Self {
            passed: true,
            output: output.into(),
            failures: Vec::new(),
        }
    }

    pub fn failed(output: impl Into<String>, failures: Vec<String>) -> Self {
        Self {
            passed: false,
            output: output.into(),
            failures,
        }
    }
}

/// How an iteration ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IterationOutcome {
    Passed,
    TestsFailed,
    /// The test runner itself failed; the code could not be verified
    ToolingError,
}

impl IterationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            IterationOutcome::Passed => "PASSED",
            IterationOutcome::TestsFailed => "TESTS_FAILED",
            IterationOutcome::ToolingError => "TOOLING_ERROR",
        }
    }
}

impl std::fmt::Display for IterationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One generate/test attempt (Value Object)
///
/// `tests_passed` is true exactly when the outcome is PASSED.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementIteration {
    index: usize,
    code: GeneratedCode,
    tests: GeneratedCode,
    tests_passed: bool,
    test_output: String,
    failures: Vec<String>,
    refinement_action: String,
    outcome: IterationOutcome,
}

impl RefinementIteration {
    /// Iteration whose tests actually ran
    pub fn from_test_run(
        index: usize,
        code: GeneratedCode,
        tests: GeneratedCode,
        refinement_action: impl Into<String>,
        run: TestRun,
    ) -> Self {
        let outcome = if run.passed {
            IterationOutcome::Passed
        } else {
            IterationOutcome::TestsFailed
        };
        Self {
            index,
            code,
            tests,
            tests_passed: run.passed,
            test_output: run.output,
            failures: run.failures,
            refinement_action: refinement_action.into(),
            outcome,
        }
    }

    /// Iteration where the test runner could not run
    pub fn tooling_error(
        index: usize,
        code: GeneratedCode,
        tests: GeneratedCode,
        refinement_action: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        Self {
            index,
            code,
            tests,
            tests_passed: false,
            failures: vec![format!("could not verify: {}", message)],
            test_output: message,
            refinement_action: refinement_action.into(),
            outcome: IterationOutcome::ToolingError,
        }
    }

    /// Iteration where an agent failed before tests could run.
    ///
    /// The failure list names the agent so the next attempt can react.
    pub fn agent_failure(
        index: usize,
        code: GeneratedCode,
        tests: GeneratedCode,
        refinement_action: impl Into<String>,
        agent: &str,
        error: &str,
    ) -> Self {
        Self {
            index,
            code,
            tests,
            tests_passed: false,
            test_output: String::new(),
            failures: vec![format!("{} agent failed: {}", agent, error)],
            refinement_action: refinement_action.into(),
            outcome: IterationOutcome::TestsFailed,
        }
    }

    /// 1-based
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn code(&self) -> &GeneratedCode {
        &self.code
    }

    pub fn tests(&self) -> &GeneratedCode {
        &self.tests
    }

    pub fn tests_passed(&self) -> bool {
        self.tests_passed
    }

    pub fn test_output(&self) -> &str {
        &self.test_output
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Empty on the first iteration
    pub fn refinement_action(&self) -> &str {
        &self.refinement_action
    }

    pub fn outcome(&self) -> IterationOutcome {
        self.outcome
    }
}
