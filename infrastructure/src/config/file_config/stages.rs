//! Per-stage deadlines from TOML (`[stages]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use synthesis_application::StageTimeouts;

use super::validation::{ConfigIssue, MAX_TIMEOUT_SECS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStagesConfig {
    pub initial_response_timeout_secs: u64,
    pub peer_review_timeout_secs: u64,
    pub meta_analysis_timeout_secs: u64,
    pub final_synthesis_timeout_secs: u64,
}

impl Default for FileStagesConfig {
    fn default() -> Self {
        let defaults = StageTimeouts::default();
        Self {
            initial_response_timeout_secs: defaults.initial_response.as_secs(),
            peer_review_timeout_secs: defaults.peer_review.as_secs(),
            meta_analysis_timeout_secs: defaults.meta_analysis.as_secs(),
            final_synthesis_timeout_secs: defaults.final_synthesis.as_secs(),
        }
    }
}

impl FileStagesConfig {
    pub fn to_timeouts(&self) -> (StageTimeouts, Vec<ConfigIssue>) {
        let defaults = StageTimeouts::default();
        let mut issues = Vec::new();
        let mut secs = |field: &str, value: u64, fallback: Duration| {
            if value == 0 {
                issues.push(ConfigIssue::zero(field));
                fallback
            } else if value > MAX_TIMEOUT_SECS {
                issues.push(ConfigIssue::above_max(field, value, MAX_TIMEOUT_SECS));
                fallback
            } else {
                Duration::from_secs(value)
            }
        };

        let timeouts = StageTimeouts {
            initial_response: secs(
                "stages.initial_response_timeout_secs",
                self.initial_response_timeout_secs,
                defaults.initial_response,
            ),
            peer_review: secs(
                "stages.peer_review_timeout_secs",
                self.peer_review_timeout_secs,
                defaults.peer_review,
            ),
            meta_analysis: secs(
                "stages.meta_analysis_timeout_secs",
                self.meta_analysis_timeout_secs,
                defaults.meta_analysis,
            ),
            final_synthesis: secs(
                "stages.final_synthesis_timeout_secs",
                self.final_synthesis_timeout_secs,
                defaults.final_synthesis,
            ),
        };
        (timeouts, issues)
    }
}
