//! Pipeline parameters: orchestration control.
//!
//! [`PipelineParams`] groups the static parameters the
//! [`StageOrchestrator`](crate::use_cases::orchestrator::StageOrchestrator)
//! reads for every run. Provider-level retry and breaker settings live with
//! the gateway.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use synthesis_domain::Stage;

/// How Stage 2 prompts treat peers that failed in Stage 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerContextMode {
    /// Leave failed peers out entirely
    #[default]
    Omit,
    /// Tell the model how many peers produced no answer
    Annotate,
}

/// Deadline for every call in a stage, measured from stage start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimeouts {
    pub initial_response: Duration,
    pub peer_review: Duration,
    pub meta_analysis: Duration,
    pub final_synthesis: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            initial_response: Duration::from_secs(120),
            peer_review: Duration::from_secs(120),
            meta_analysis: Duration::from_secs(180),
            final_synthesis: Duration::from_secs(180),
        }
    }
}

impl StageTimeouts {
    /// Same deadline for every stage
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            initial_response: timeout,
            peer_review: timeout,
            meta_analysis: timeout,
            final_synthesis: timeout,
        }
    }

    pub fn for_stage(&self, stage: Stage) -> Duration {
        match stage {
            Stage::InitialResponse => self.initial_response,
            Stage::PeerReview => self.peer_review,
            Stage::MetaAnalysis => self.meta_analysis,
            Stage::FinalSynthesis => self.final_synthesis,
        }
    }
}

/// Orchestration control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineParams {
    pub stage_timeouts: StageTimeouts,
    /// Timeout for a single network attempt
    pub call_timeout: Duration,
    /// Overall run deadline; reaching it cancels the run
    pub run_timeout: Option<Duration>,
    /// Ceiling on in-flight provider calls per run
    pub max_concurrent_calls: usize,
    pub peer_context: PeerContextMode,
    /// Default designated model for Stages 3 and 4
    pub moderator: Option<String>,
    /// Stage 3 models; empty means the moderator alone
    pub meta_analysis_models: Vec<String>,
    /// Stage 4 model; falls back to the moderator
    pub synthesizer: Option<String>,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            stage_timeouts: StageTimeouts::default(),
            call_timeout: Duration::from_secs(60),
            run_timeout: Some(Duration::from_secs(600)),
            max_concurrent_calls: 8,
            peer_context: PeerContextMode::Omit,
            moderator: None,
            meta_analysis_models: Vec::new(),
            synthesizer: None,
        }
    }
}

impl PipelineParams {
    // ==================== Builder Methods ====================

    pub fn with_stage_timeouts(mut self, timeouts: StageTimeouts) -> Self {
        self.stage_timeouts = timeouts;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_run_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.run_timeout = timeout;
        self
    }

    pub fn with_max_concurrent_calls(mut self, max: usize) -> Self {
        self.max_concurrent_calls = max.max(1);
        self
    }

    pub fn with_peer_context(mut self, mode: PeerContextMode) -> Self {
        self.peer_context = mode;
        self
    }

    pub fn with_moderator(mut self, model: impl Into<String>) -> Self {
        self.moderator = Some(model.into());
        self
    }

    pub fn with_meta_analysis_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meta_analysis_models = models.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_synthesizer(mut self, model: impl Into<String>) -> Self {
        self.synthesizer = Some(model.into());
        self
    }
}
