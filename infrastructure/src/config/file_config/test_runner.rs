//! Test runner settings from TOML (`[test_runner]` section)

use crate::test_runner::ProcessTestRunner;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use weaver_domain::{ConfigIssue, ConfigIssueCode};

/// Raw test runner configuration from TOML
///
/// Generated files are written at their own paths inside a fresh temporary
/// directory; blocks the agent left unnamed go to `code_file` / `test_file`.
///
/// # Example
///
/// ```toml
/// [test_runner]
/// command = "pytest"
/// args = ["-q"]
/// code_file = "solution.py"
/// test_file = "test_solution.py"
/// timeout_secs = 120
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTestRunnerConfig {
    pub command: String,
    pub args: Vec<String>,
    pub code_file: String,
    pub test_file: String,
    pub timeout_secs: u64,
}

impl Default for FileTestRunnerConfig {
    fn default() -> Self {
        Self {
            command: "cargo".to_string(),
            args: vec!["test".to_string(), "--quiet".to_string()],
            code_file: "src/lib.rs".to_string(),
            test_file: "tests/generated.rs".to_string(),
            timeout_secs: 300,
        }
    }
}

impl FileTestRunnerConfig {
    pub fn to_runner(&self) -> ProcessTestRunner {
        ProcessTestRunner::new(self.command.clone(), self.args.clone())
            .with_files(self.code_file.clone(), self.test_file.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.command.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyCommand {
                    section: "test_runner".to_string(),
                },
                "test_runner.command cannot be empty",
            ));
        }
        if self.timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidValue {
                    field: "test_runner.timeout_secs".to_string(),
                    value: "0".to_string(),
                },
                "test_runner.timeout_secs cannot be 0",
            ));
        }
        issues
    }
}
