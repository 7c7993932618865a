//! Result store port.
//!
//! Persists a finished [`PipelineResult`] in a machine-readable and a
//! human-readable form. Failure to persist never invalidates the result.

use async_trait::async_trait;
use synthesis_domain::{PipelineResult, StorageLocations};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to write {path}: {message}")]
    Io { path: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Write both artifacts for `result`, named after its artifact key
    async fn store(&self, result: &PipelineResult) -> Result<StorageLocations, PersistenceError>;
}
