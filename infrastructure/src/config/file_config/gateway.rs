//! LLM command settings from TOML (`[gateway]` section)

use serde::{Deserialize, Serialize};
use weaver_domain::{ConfigIssue, ConfigIssueCode};

/// Raw gateway configuration from TOML
///
/// The command receives the system prompt and the prompt on stdin and
/// answers on stdout. `{model}` in any argument is replaced with the
/// agent's model name.
///
/// # Example
///
/// ```toml
/// [gateway]
/// command = "llm"
/// args = ["--model", "{model}", "--no-stream"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGatewayConfig {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for FileGatewayConfig {
    fn default() -> Self {
        Self {
            command: "llm".to_string(),
            args: vec!["--model".to_string(), "{model}".to_string()],
        }
    }
}

impl FileGatewayConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        if self.command.trim().is_empty() {
            return vec![ConfigIssue::error(
                ConfigIssueCode::EmptyCommand {
                    section: "gateway".to_string(),
                },
                "gateway.command cannot be empty",
            )];
        }
        Vec::new()
    }
}
