//! Context retrieval infrastructure
//!
//! [`LocalContextProvider`] implements the
//! [`ContextProvider`](weaver_application::ContextProvider) port by reading
//! well-known project files from the repository root.

mod loader;

pub use loader::LocalContextProvider;
