//! Code change value objects

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full replacement content for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChange {
    pub path: String,
    pub content: String,
}

impl CodeChange {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Code produced by a GENERATE agent (Value Object)
///
/// Changes keep the order the agent emitted them in. A path appears at most
/// once; a later block for the same path replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCode {
    changes: Vec<CodeChange>,
}

impl GeneratedCode {
    pub fn new(changes: impl IntoIterator<Item = CodeChange>) -> Self {
        let mut code = Self::default();
        for change in changes {
            code.upsert(change);
        }
        code
    }

    /// Parse fenced code blocks out of an agent response.
    ///
    /// A response without any fenced block is treated as a single unnamed
    /// file so that plain-text answers still flow through evaluation.
    pub fn from_response(response: &str) -> Self {
        let changes = super::parsing::parse_code_blocks(response);
        if changes.is_empty() && !response.trim().is_empty() {
            return Self::new([CodeChange::new("generated.txt", response.trim())]);
        }
        Self::new(changes)
    }

    fn upsert(&mut self, change: CodeChange) {
        match self.changes.iter_mut().find(|c| c.path == change.path) {
            Some(existing) => existing.content = change.content,
            None => self.changes.push(change),
        }
    }

    pub fn changes(&self) -> &[CodeChange] {
        &self.changes
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.changes
            .iter()
            .find(|c| c.path == path)
            .map(|c| c.content.as_str())
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(|c| c.path.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// A new value with the given files replaced or added.
    ///
    /// `self` is left untouched.
    pub fn with_replacements(&self, replacements: &BTreeMap<String, String>) -> Self {
        let mut merged = self.clone();
        for (path, content) in replacements {
            merged.upsert(CodeChange::new(path.clone(), content.clone()));
        }
        merged
    }

    /// Render as fenced blocks with path headers, for use inside prompts.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for change in &self.changes {
            let lang = language_hint(&change.path);
            out.push_str(&format!(
                "### {}\n```{}\n{}\n```\n\n",
                change.path,
                lang,
                change.content.trim_end()
            ));
        }
        out
    }
}

fn language_hint(path: &str) -> &'static str {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("rs") => "rust",
        Some("py") => "python",
        Some("ts") | Some("tsx") => "typescript",
        Some("js") | Some("jsx") => "javascript",
        Some("go") => "go",
        Some("java") => "java",
        Some("toml") => "toml",
        Some("json") => "json",
        Some("sh") => "bash",
        _ => "",
    }
}
