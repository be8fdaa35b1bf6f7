//! Query value object

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Unique identifier for one request/response cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random (v4) request id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A file or selection the user attached to the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Path relative to the repository root
    pub path: String,
    /// Selected text, or the whole file when no selection was made
    pub content: String,
}

impl Attachment {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// A request entering the pipeline (Value Object)
///
/// Immutable once built: the router, scheduler, evaluator and refinement
/// loop all read the same query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    id: RequestId,
    text: String,
    repository: Option<String>,
    attachments: Vec<Attachment>,
}

impl Query {
    /// Build a query with a freshly generated request id.
    ///
    /// Returns [`DomainError::InvalidQuery`] for empty or whitespace-only text.
    pub fn try_new(text: impl Into<String>) -> Result<Self, DomainError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(DomainError::InvalidQuery(
                "query text cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            id: RequestId::generate(),
            text,
            repository: None,
            attachments: Vec::new(),
        })
    }

    pub fn with_id(mut self, id: RequestId) -> Self {
        self.id = id;
        self
    }

    /// Set the repository context handle (usually the repository root).
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_creation() {
        let q = Query::try_new("How does routing work?").unwrap();
        assert_eq!(q.text(), "How does routing work?");
        assert!(q.repository().is_none());
        assert!(q.attachments().is_empty());
    }

    #[test]
    fn test_empty_query_rejected() {
        assert!(Query::try_new("").is_err());
        assert!(Query::try_new("   \n").is_err());
    }

    #[test]
    fn test_builders() {
        let q = Query::try_new("Fix the bug")
            .unwrap()
            .with_id(RequestId::new("req-1"))
            .with_repository("/srv/repo")
            .with_attachment(Attachment::new("src/db.rs", "fn connect() {}"));

        assert_eq!(q.id().as_str(), "req-1");
        assert_eq!(q.repository(), Some("/srv/repo"));
        assert_eq!(q.attachments()[0].path, "src/db.rs");
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(RequestId::generate(), RequestId::generate());
    }
}
