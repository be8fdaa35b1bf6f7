//! Local file system context provider
//!
//! Reads, in order:
//!
//! 1. `CLAUDE.md` - project instructions
//! 2. `README.md` - project readme
//! 3. `Cargo.toml`, `package.json`, `pyproject.toml` - build configs
//!
//! followed by every file attached to the query. Each snippet is truncated
//! to [`LocalContextProvider::max_snippet_bytes`].

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use weaver_application::{ContextError, ContextProvider};
use weaver_domain::util::truncate_str;
use weaver_domain::{ContextSnippet, Query};

/// Project files read on every request, in output order
pub const KNOWN_FILES: [&str; 5] = [
    "CLAUDE.md",
    "README.md",
    "Cargo.toml",
    "package.json",
    "pyproject.toml",
];

const DEFAULT_MAX_SNIPPET_BYTES: usize = 8 * 1024;
const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Context provider that reads from the local file system.
///
/// The repository root is taken from [`Query::repository`], falling back to
/// the provider's default root (usually the working directory).
#[derive(Debug, Clone)]
pub struct LocalContextProvider {
    default_root: PathBuf,
    max_snippet_bytes: usize,
}

impl LocalContextProvider {
    pub fn new(default_root: impl Into<PathBuf>) -> Self {
        Self {
            default_root: default_root.into(),
            max_snippet_bytes: DEFAULT_MAX_SNIPPET_BYTES,
        }
    }

    pub fn with_max_snippet_bytes(mut self, bytes: usize) -> Self {
        self.max_snippet_bytes = bytes;
        self
    }

    pub fn max_snippet_bytes(&self) -> usize {
        self.max_snippet_bytes
    }

    fn root_for(&self, query: &Query) -> PathBuf {
        query
            .repository()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.default_root.clone())
    }

    fn snippet(&self, source: impl Into<String>, content: &str) -> ContextSnippet {
        let truncated = truncate_str(content, self.max_snippet_bytes);
        if truncated.len() < content.len() {
            ContextSnippet::new(source, format!("{}{}", truncated, TRUNCATION_MARKER))
        } else {
            ContextSnippet::new(source, content)
        }
    }

    /// Loads a single known file; missing, empty, or unreadable files are skipped.
    fn load_file(&self, root: &Path, name: &str) -> Option<ContextSnippet> {
        let path = root.join(name);
        if !path.is_file() {
            return None;
        }
        match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => {
                debug!("Skipping empty file: {:?}", path);
                None
            }
            Ok(content) => {
                debug!("Loaded context file: {:?}", path);
                Some(self.snippet(name, &content))
            }
            Err(e) => {
                warn!("Failed to read file {:?}: {}", path, e);
                None
            }
        }
    }
}

impl Default for LocalContextProvider {
    fn default() -> Self {
        Self::new(".")
    }
}

#[async_trait]
impl ContextProvider for LocalContextProvider {
    async fn get_context(&self, query: &Query) -> Result<Vec<ContextSnippet>, ContextError> {
        let root = self.root_for(query);
        if !root.is_dir() {
            return Err(ContextError::RepositoryNotFound(
                root.display().to_string(),
            ));
        }

        let mut snippets: Vec<ContextSnippet> = KNOWN_FILES
            .iter()
            .filter_map(|name| self.load_file(&root, name))
            .collect();

        for attachment in query.attachments() {
            snippets.push(self.snippet(attachment.path.as_str(), &attachment.content));
        }

        debug!("Loaded {} context snippets from {:?}", snippets.len(), root);
        Ok(snippets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use weaver_domain::Attachment;

    fn query_in(root: &Path) -> Query {
        Query::try_new("How is the database configured?")
            .unwrap()
            .with_repository(root.to_string_lossy())
    }

    #[tokio::test]
    async fn test_loads_known_files_in_order() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("README.md"), "# Demo").unwrap();
        fs::write(root.join("CLAUDE.md"), "Use sqlx").unwrap();
        fs::write(root.join("Cargo.toml"), "[package]\nname = \"demo\"").unwrap();
        fs::write(root.join("package.json"), "   \n").unwrap();

        let snippets = LocalContextProvider::default()
            .get_context(&query_in(root))
            .await
            .unwrap();

        let sources: Vec<_> = snippets.iter().map(|s| s.source.as_str()).collect();
        assert_eq!(sources, vec!["CLAUDE.md", "README.md", "Cargo.toml"]);
        assert_eq!(snippets[0].content, "Use sqlx");
    }

    #[tokio::test]
    async fn test_attachments_follow_project_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "# Demo").unwrap();
        let query = query_in(dir.path())
            .with_attachment(Attachment::new("src/db.rs", "fn connect() {}"));

        let snippets = LocalContextProvider::default()
            .get_context(&query)
            .await
            .unwrap();

        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[1], ContextSnippet::new("src/db.rs", "fn connect() {}"));
    }

    #[tokio::test]
    async fn test_snippets_are_truncated() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "é".repeat(100)).unwrap();

        let snippets = LocalContextProvider::default()
            .with_max_snippet_bytes(11)
            .get_context(&query_in(dir.path()))
            .await
            .unwrap();

        assert_eq!(snippets[0].content, format!("{}{}", "é".repeat(5), TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn test_default_root_used_without_repository() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("pyproject.toml"), "[project]").unwrap();

        let snippets = LocalContextProvider::new(dir.path())
            .get_context(&Query::try_new("explain").unwrap())
            .await
            .unwrap();

        assert_eq!(snippets[0].source, "pyproject.toml");
    }

    #[tokio::test]
    async fn test_missing_repository_is_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = LocalContextProvider::default()
            .get_context(&query_in(&missing))
            .await
            .unwrap_err();

        assert!(matches!(err, ContextError::RepositoryNotFound(_)));
    }
}
