use serde::{Deserialize, Serialize};

/// A piece of repository context retrieved for a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSnippet {
    /// Where the content came from (file path or other locator)
    pub source: String,
    pub content: String,
}

impl ContextSnippet {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }

    /// Render snippets as labelled sections for a prompt.
    pub fn render_all(snippets: &[ContextSnippet]) -> String {
        snippets
            .iter()
            .map(|s| format!("--- {} ---\n{}\n", s.source, s.content.trim_end()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
