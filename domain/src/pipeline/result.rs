//! Final result object handed back to the caller

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::entities::PipelineRequest;
use super::value_objects::StageResult;
use crate::core::string::file_component;

/// Where the two persisted representations landed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLocations {
    /// Machine-readable JSON
    pub structured: PathBuf,
    /// Human-readable Markdown
    pub readable: PathBuf,
}

/// Deterministic name for a run's persisted artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactKey {
    pub timestamp: DateTime<Utc>,
    pub caller_id: Option<String>,
}

impl ArtifactKey {
    pub fn new(timestamp: DateTime<Utc>, caller_id: Option<&str>) -> Self {
        Self {
            timestamp,
            caller_id: caller_id.and_then(file_component),
        }
    }

    /// `synthesis_<YYYYMMDDTHHMMSSZ>[_<caller>]`
    pub fn file_stem(&self) -> String {
        let ts = self.timestamp.format("%Y%m%dT%H%M%SZ");
        match &self.caller_id {
            Some(caller) => format!("synthesis_{}_{}", ts, caller),
            None => format!("synthesis_{}", ts),
        }
    }
}

/// Complete result of a successful pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub run_id: String,
    /// Echo of the accepted request
    pub request: PipelineRequest,
    /// One entry per stage, in stage order
    pub stages: Vec<StageResult>,
    /// The canonical answer from the final stage
    pub final_answer: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageLocations>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence_error: Option<String>,
}

impl PipelineResult {
    pub fn artifact_key(&self) -> ArtifactKey {
        ArtifactKey::new(self.finished_at, self.request.caller_id())
    }

    /// Pretty JSON of the result without storage outcome fields
    pub fn structured_content(&self) -> serde_json::Result<String> {
        let mut bare = self.clone();
        bare.storage = None;
        bare.persistence_error = None;
        serde_json::to_string_pretty(&bare)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_stem_without_caller() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 17, 9, 5, 3).unwrap();
        assert_eq!(
            ArtifactKey::new(ts, None).file_stem(),
            "synthesis_20261017T090503Z"
        );
    }

    #[test]
    fn test_file_stem_sanitizes_caller() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            ArtifactKey::new(ts, Some("team a/../x")).file_stem(),
            "synthesis_20260102T030405Z_team-a----x"
        );
        assert_eq!(
            ArtifactKey::new(ts, Some("///")).file_stem(),
            "synthesis_20260102T030405Z"
        );
    }
}
