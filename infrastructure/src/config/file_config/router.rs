//! Router settings from TOML (`[router]` section)

use serde::{Deserialize, Serialize};
use weaver_domain::{ConfigIssue, ConfigIssueCode, SafetyGate};

/// Raw router configuration from TOML
///
/// # Example
///
/// ```toml
/// [router]
/// unsafe_patterns = ["(?i)\\bkeylogger\\b", "(?i)disable (the )?audit log"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRouterConfig {
    /// Regexes refused in addition to the built-in unsafe-intent patterns
    pub unsafe_patterns: Vec<String>,
}

impl FileRouterConfig {
    /// Build the safety gate. Any invalid pattern is an error; the gate then
    /// falls back to the built-in patterns.
    pub fn to_safety_gate(&self) -> (SafetyGate, Vec<ConfigIssue>) {
        let issues: Vec<ConfigIssue> = self
            .unsafe_patterns
            .iter()
            .filter_map(|p| {
                regex::Regex::new(p).err().map(|e| {
                    ConfigIssue::error(
                        ConfigIssueCode::InvalidPattern { pattern: p.clone() },
                        format!("router.unsafe_patterns: invalid regex `{}`: {}", p, e),
                    )
                })
            })
            .collect();
        if !issues.is_empty() {
            return (SafetyGate::new(), issues);
        }

        match SafetyGate::with_patterns(&self.unsafe_patterns) {
            Ok(gate) => (gate, issues),
            Err(_) => (SafetyGate::new(), issues),
        }
    }
}
