//! Orchestration settings from TOML (`[pipeline]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use synthesis_application::PeerContextMode;

use super::validation::{ConfigIssue, MAX_CONCURRENT_CALLS, MAX_TIMEOUT_SECS};

/// ```toml
/// [pipeline]
/// call_timeout_secs = 60
/// run_timeout_secs = 600     # 0 disables the run deadline
/// max_concurrent_calls = 8
/// peer_context = "omit"      # or "annotate"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePipelineConfig {
    pub call_timeout_secs: u64,
    pub run_timeout_secs: u64,
    pub max_concurrent_calls: usize,
    pub peer_context: String,
}

impl Default for FilePipelineConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: 60,
            run_timeout_secs: 600,
            max_concurrent_calls: 8,
            peer_context: "omit".to_string(),
        }
    }
}

impl FilePipelineConfig {
    pub fn call_timeout(&self) -> (Duration, Vec<ConfigIssue>) {
        if self.call_timeout_secs == 0 {
            return (
                Duration::from_secs(Self::default().call_timeout_secs),
                vec![ConfigIssue::zero("pipeline.call_timeout_secs")],
            );
        }
        if self.call_timeout_secs > MAX_TIMEOUT_SECS {
            return (
                Duration::from_secs(Self::default().call_timeout_secs),
                vec![ConfigIssue::above_max(
                    "pipeline.call_timeout_secs",
                    self.call_timeout_secs,
                    MAX_TIMEOUT_SECS,
                )],
            );
        }
        (Duration::from_secs(self.call_timeout_secs), Vec::new())
    }

    /// Run deadline; `0` disables it
    pub fn run_timeout(&self) -> (Option<Duration>, Vec<ConfigIssue>) {
        if self.run_timeout_secs > MAX_TIMEOUT_SECS {
            return (
                Some(Duration::from_secs(Self::default().run_timeout_secs)),
                vec![ConfigIssue::above_max(
                    "pipeline.run_timeout_secs",
                    self.run_timeout_secs,
                    MAX_TIMEOUT_SECS,
                )],
            );
        }
        let timeout = (self.run_timeout_secs > 0).then(|| Duration::from_secs(self.run_timeout_secs));
        (timeout, Vec::new())
    }

    pub fn parse_max_concurrent_calls(&self) -> (usize, Vec<ConfigIssue>) {
        if self.max_concurrent_calls == 0 {
            return (1, vec![ConfigIssue::zero("pipeline.max_concurrent_calls")]);
        }
        if self.max_concurrent_calls > MAX_CONCURRENT_CALLS {
            return (
                MAX_CONCURRENT_CALLS,
                vec![ConfigIssue::above_max(
                    "pipeline.max_concurrent_calls",
                    self.max_concurrent_calls as u64,
                    MAX_CONCURRENT_CALLS as u64,
                )],
            );
        }
        (self.max_concurrent_calls, Vec::new())
    }

    pub fn parse_peer_context(&self) -> (PeerContextMode, Vec<ConfigIssue>) {
        match self.peer_context.trim().to_ascii_lowercase().as_str() {
            "omit" => (PeerContextMode::Omit, Vec::new()),
            "annotate" => (PeerContextMode::Annotate, Vec::new()),
            _ => (
                PeerContextMode::Omit,
                vec![ConfigIssue::invalid_enum(
                    "pipeline.peer_context",
                    &self.peer_context,
                    &["omit", "annotate"],
                )],
            ),
        }
    }
}
