//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL transcript path; no transcript is written when unset
    pub conversation_log: Option<PathBuf>,
    /// Directory for the rolling diagnostic log (same as `--log-dir`)
    pub log_dir: Option<PathBuf>,
}
