//! Test runner port
//!
//! Runs generated tests against generated code in an isolated workspace.
//! A failing test suite is a normal [`TestRun`]; an `Err` means the runner
//! itself could not do its job (tooling error).

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use weaver_domain::{GeneratedCode, TestRun};

#[derive(Error, Debug)]
pub enum TestRunnerError {
    #[error("Failed to prepare workspace: {0}")]
    Workspace(String),

    #[error("Failed to start test command: {0}")]
    Spawn(String),

    #[error("Test suite could not start: {0}")]
    SuiteNotStarted(String),

    #[error("Test run timed out after {0:?}")]
    Timeout(Duration),

    #[error("Other error: {0}")]
    Other(String),
}

#[async_trait]
pub trait TestRunner: Send + Sync {
    async fn run(
        &self,
        code: &GeneratedCode,
        tests: &GeneratedCode,
    ) -> Result<TestRun, TestRunnerError>;
}
