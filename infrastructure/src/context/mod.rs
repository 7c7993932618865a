//! Document context infrastructure
//!
//! Implements the [`ContextResolver`] port for references that name local
//! files.
//!
//! [`ContextResolver`]: synthesis_application::ContextResolver

mod loader;

pub use loader::{DEFAULT_MAX_DOCUMENT_BYTES, LocalDocumentResolver};
