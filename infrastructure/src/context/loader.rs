//! Local file system document resolver
//!
//! Treats each document reference as a path. Relative paths are resolved
//! against the resolver's base directory and a leading `~/` expands to the
//! home directory. Oversized files are truncated rather than rejected so one
//! large attachment cannot crowd every other document out of the prompt.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use synthesis_application::{ContextError, ContextResolver, ResolvedDocument};
use synthesis_domain::truncate;
use tracing::debug;

/// Per-document cap on included text, in bytes
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 64 * 1024;

/// Document resolver that reads from the local file system.
#[derive(Debug, Clone)]
pub struct LocalDocumentResolver {
    base_dir: PathBuf,
    max_bytes: usize,
}

impl LocalDocumentResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            max_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn path_for(&self, id: &str) -> PathBuf {
        if let Some(rest) = id.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        let path = Path::new(id);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

#[async_trait]
impl ContextResolver for LocalDocumentResolver {
    async fn resolve(&self, id: &str) -> Result<ResolvedDocument, ContextError> {
        let path = self.path_for(id);
        if !path.is_file() {
            return Err(ContextError::NotAvailable(format!(
                "{} is not a readable file",
                path.display()
            )));
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ContextError::ResolutionFailed(format!("{}: {}", path.display(), e)))?;
        if content.trim().is_empty() {
            return Err(ContextError::ResolutionFailed(format!(
                "{} is empty",
                path.display()
            )));
        }

        debug!("Loaded document: {:?} ({} bytes)", path, content.len());
        Ok(ResolvedDocument {
            id: id.to_string(),
            content: truncate(&content, self.max_bytes),
        })
    }
}
