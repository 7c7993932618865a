//! File-backed result store
//!
//! Writes `<dir>/<stem>.json` and `<dir>/<stem>.md`, where the stem comes
//! from the result's artifact key. Two runs finishing in the same second
//! with the same caller get `_2`, `_3`, ... appended instead of
//! overwriting each other.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use synthesis_application::{PersistenceError, ResultStore};
use synthesis_domain::{PipelineResult, StorageLocations};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use super::markdown::MarkdownRenderer;

pub struct FileResultStore {
    dir: PathBuf,
}

impl FileResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn io_error(path: &Path, err: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Create the JSON file exclusively so a concurrent writer cannot claim
    /// the same stem
    async fn claim(&self, stem: &str) -> Result<(String, fs::File), PersistenceError> {
        let mut suffix = 1u32;
        loop {
            let candidate = if suffix == 1 {
                stem.to_string()
            } else {
                format!("{}_{}", stem, suffix)
            };
            let path = self.dir.join(format!("{}.json", candidate));
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((candidate, file)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(Self::io_error(&path, e)),
            }
        }
    }

    async fn write_artifacts(
        mut json_file: fs::File,
        json_path: &Path,
        structured: &str,
        md_path: &Path,
        readable: &str,
    ) -> Result<(), PersistenceError> {
        json_file
            .write_all(structured.as_bytes())
            .await
            .map_err(|e| Self::io_error(json_path, e))?;
        json_file
            .flush()
            .await
            .map_err(|e| Self::io_error(json_path, e))?;
        fs::write(md_path, readable)
            .await
            .map_err(|e| Self::io_error(md_path, e))
    }
}

#[async_trait]
impl ResultStore for FileResultStore {
    async fn store(&self, result: &PipelineResult) -> Result<StorageLocations, PersistenceError> {
        let structured = result
            .structured_content()
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        let readable = MarkdownRenderer::render(result);

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Self::io_error(&self.dir, e))?;

        let (stem, json_file) = self.claim(&result.artifact_key().file_stem()).await?;
        let json_path = self.dir.join(format!("{}.json", stem));
        let md_path = self.dir.join(format!("{}.md", stem));

        let written =
            Self::write_artifacts(json_file, &json_path, &structured, &md_path, &readable).await;
        if let Err(err) = written {
            // A result is stored whole or not at all
            if let Err(e) = fs::remove_file(&json_path).await {
                warn!(path = %json_path.display(), "failed to remove partial artifact: {}", e);
            }
            return Err(err);
        }

        info!(run_id = %result.run_id, path = %json_path.display(), "result persisted");
        Ok(StorageLocations {
            structured: json_path,
            readable: md_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::markdown::tests::sample_result;

    #[tokio::test]
    async fn test_store_writes_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileResultStore::new(dir.path().join("out"));
        let result = sample_result(Some("team-a"));

        let locations = store.store(&result).await.unwrap();
        assert_eq!(
            locations.structured.file_name().unwrap(),
            "synthesis_20261017T090503Z_team-a.json"
        );
        assert_eq!(
            locations.readable.file_name().unwrap(),
            "synthesis_20261017T090503Z_team-a.md"
        );

        let json = std::fs::read_to_string(&locations.structured).unwrap();
        assert_eq!(json, result.structured_content().unwrap());
        let parsed: PipelineResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.final_answer, "Rayleigh scattering.");

        let md = std::fs::read_to_string(&locations.readable).unwrap();
        assert!(md.contains("## Final Answer"));
    }

    #[tokio::test]
    async fn test_same_stem_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileResultStore::new(dir.path());
        let result = sample_result(None);

        let first = store.store(&result).await.unwrap();
        let second = store.store(&result).await.unwrap();
        assert_ne!(first.structured, second.structured);
        assert_eq!(
            second.structured.file_name().unwrap(),
            "synthesis_20261017T090503Z_2.json"
        );
        assert!(first.structured.exists());
    }

    #[tokio::test]
    async fn test_unwritable_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        let store = FileResultStore::new(blocker.join("nested"));
        let err = store.store(&sample_result(None)).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Io { .. }));
    }

    #[tokio::test]
    async fn test_failed_markdown_write_removes_json() {
        let dir = tempfile::tempdir().unwrap();
        let result = sample_result(None);
        let stem = result.artifact_key().file_stem();
        // A directory where the markdown file should go makes the write fail
        std::fs::create_dir(dir.path().join(format!("{}.md", stem))).unwrap();

        let store = FileResultStore::new(dir.path());
        let err = store.store(&result).await.unwrap_err();
        match err {
            PersistenceError::Io { path, .. } => assert!(path.ends_with(".md")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!dir.path().join(format!("{}.json", stem)).exists());
    }
}
