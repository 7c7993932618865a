//! Context resolver port.
//!
//! Turns the opaque document references attached to a request into text
//! that is prepended to the Stage 1 prompt. Infrastructure adapters decide
//! what a reference means (a file path, a URL, a database key).

use async_trait::async_trait;

/// A resolved document with its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDocument {
    /// The reference as supplied by the caller
    pub id: String,
    pub content: String,
}

/// Errors that can occur during document resolution.
#[derive(Debug)]
pub enum ContextError {
    /// No resolver is available for this kind of reference
    NotAvailable(String),
    /// Resolution failed for some other reason
    ResolutionFailed(String),
}

impl std::fmt::Display for ContextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextError::NotAvailable(msg) => write!(f, "Not available: {}", msg),
            ContextError::ResolutionFailed(msg) => write!(f, "Resolution failed: {}", msg),
        }
    }
}

impl std::error::Error for ContextError {}

/// Port for resolving document references to their content.
#[async_trait]
pub trait ContextResolver: Send + Sync {
    /// Resolve a single reference to its content.
    async fn resolve(&self, id: &str) -> Result<ResolvedDocument, ContextError>;

    /// Resolve multiple references concurrently, skipping errors.
    ///
    /// Output keeps the input order.
    async fn resolve_all(&self, ids: &[String]) -> Vec<ResolvedDocument> {
        use futures::future::join_all;

        let futures: Vec<_> = ids.iter().map(|id| self.resolve(id)).collect();
        let results = join_all(futures).await;

        results
            .into_iter()
            .zip(ids.iter())
            .filter_map(|(result, id)| match result {
                Ok(resolved) => Some(resolved),
                Err(e) => {
                    tracing::warn!("Skipping document {}: {}", id, e);
                    None
                }
            })
            .collect()
    }
}

/// Resolver used when no document source is wired in
pub struct NoContext;

#[async_trait]
impl ContextResolver for NoContext {
    async fn resolve(&self, id: &str) -> Result<ResolvedDocument, ContextError> {
        Err(ContextError::NotAvailable(format!(
            "no document source configured for '{}'",
            id
        )))
    }
}
