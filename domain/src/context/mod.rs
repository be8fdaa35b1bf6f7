//! Retrieved context handed to agents alongside the request text.

pub mod snippet;

pub use snippet::ContextSnippet;
