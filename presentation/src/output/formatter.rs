//! Output formatter trait

use weaver_domain::{OutputFormat, PipelineResult};

/// Trait for formatting pipeline results
pub trait OutputFormatter {
    /// Format the complete pipeline result
    fn format(&self, result: &PipelineResult) -> String;

    /// Format as JSON
    fn format_json(&self, result: &PipelineResult) -> String;

    /// Format the answer and headline decisions only
    fn format_summary(&self, result: &PipelineResult) -> String;

    /// Dispatch on an [`OutputFormat`]
    fn render(&self, result: &PipelineResult, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => self.format(result),
            OutputFormat::Summary => self.format_summary(result),
            OutputFormat::Json => self.format_json(result),
        }
    }
}
