//! Context provider port
//!
//! Retrieval of repository context for a query. Ranking quality is the
//! adapter's business; the pipeline only needs snippets.

use async_trait::async_trait;
use thiserror::Error;
use weaver_domain::{ContextSnippet, Query};

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

#[async_trait]
pub trait ContextProvider: Send + Sync {
    async fn get_context(&self, query: &Query) -> Result<Vec<ContextSnippet>, ContextError>;
}

/// Provider that never returns context
pub struct NoContext;

#[async_trait]
impl ContextProvider for NoContext {
    async fn get_context(&self, _query: &Query) -> Result<Vec<ContextSnippet>, ContextError> {
        Ok(Vec::new())
    }
}
