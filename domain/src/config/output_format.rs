//! Output format value object

use serde::{Deserialize, Serialize};

/// How a pipeline result is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Route, every phase, every agent task
    Full,
    /// Answer, final code and the headline decisions (default)
    #[default]
    Summary,
    /// The whole `PipelineResult` as JSON
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(OutputFormat::Full),
            "summary" => Ok(OutputFormat::Summary),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "Unknown output format: {}. Valid: full, summary, json",
                other
            )),
        }
    }
}
