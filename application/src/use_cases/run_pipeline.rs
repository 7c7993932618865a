//! Run Pipeline use case
//!
//! Entry point for a synthesis run: gate the request, orchestrate the four
//! stages, then aggregate (and optionally persist) the result.

use synthesis_domain::{
    EligibilityGate, ErrorPayload, GateDecision, GatingRejection, PipelineRequest, PipelineResult,
    PipelineRun, RunFailureCode, RunState, Stage, StatusClass,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::finalize::ResultAggregator;
use super::orchestrator::StageOrchestrator;
use crate::ports::progress::{NoProgress, ProgressNotifier};

/// Errors surfaced to the caller of a pipeline run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Request rejected: {0}")]
    Rejected(GatingRejection),

    #[error("Run {run_id} failed in {stage}: {detail}")]
    StageFailed {
        run_id: String,
        stage: Stage,
        detail: String,
    },

    #[error("Run {run_id} was cancelled")]
    Cancelled { run_id: String, stage: Option<Stage> },

    #[error("Internal error")]
    Internal { run_id: Option<String> },
}

impl PipelineError {
    /// Fixed-shape payload for the external boundary
    pub fn payload(&self) -> ErrorPayload {
        match self {
            PipelineError::Rejected(rejection) => rejection.payload(),
            PipelineError::StageFailed { detail, .. } => ErrorPayload::new(
                StatusClass::BadGateway,
                RunFailureCode::StageFailed.as_str(),
                detail.clone(),
            ),
            PipelineError::Cancelled { .. } => ErrorPayload::new(
                StatusClass::GatewayTimeout,
                RunFailureCode::Cancelled.as_str(),
                "run cancelled or deadline exceeded before completion",
            ),
            PipelineError::Internal { .. } => ErrorPayload::new(
                StatusClass::Internal,
                RunFailureCode::InternalError.as_str(),
                "internal error",
            ),
        }
    }

    pub fn run_id(&self) -> Option<&str> {
        match self {
            PipelineError::Rejected(_) => None,
            PipelineError::StageFailed { run_id, .. } | PipelineError::Cancelled { run_id, .. } => {
                Some(run_id)
            }
            PipelineError::Internal { run_id } => run_id.as_deref(),
        }
    }

    fn from_failed_run(run: &PipelineRun) -> Self {
        let run_id = run.id().to_string();
        match run.failure() {
            Some(failure) => match (failure.reason_code, failure.stage) {
                (RunFailureCode::StageFailed, Some(stage)) => PipelineError::StageFailed {
                    run_id,
                    stage,
                    detail: failure.detail.clone(),
                },
                (RunFailureCode::Cancelled, stage) => PipelineError::Cancelled { run_id, stage },
                _ => PipelineError::Internal {
                    run_id: Some(run_id),
                },
            },
            None => PipelineError::Internal {
                run_id: Some(run_id),
            },
        }
    }
}

/// Use case for running the synthesis pipeline
pub struct RunPipelineUseCase {
    gate: EligibilityGate,
    orchestrator: StageOrchestrator,
    aggregator: ResultAggregator,
}

impl RunPipelineUseCase {
    pub fn new(gate: EligibilityGate, orchestrator: StageOrchestrator) -> Self {
        Self {
            gate,
            orchestrator,
            aggregator: ResultAggregator::new(),
        }
    }

    pub fn with_aggregator(mut self, aggregator: ResultAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn gate(&self) -> &EligibilityGate {
        &self.gate
    }

    pub fn orchestrator(&self) -> &StageOrchestrator {
        &self.orchestrator
    }

    /// Execute with no progress subscriber and no external cancellation
    pub async fn execute(&self, request: PipelineRequest) -> Result<PipelineResult, PipelineError> {
        self.execute_with_progress(request, &NoProgress, CancellationToken::new())
            .await
    }

    /// Execute, streaming events to `progress`; cancelling `cancel` stops
    /// the run at the next opportunity
    pub async fn execute_with_progress(
        &self,
        request: PipelineRequest,
        progress: &dyn ProgressNotifier,
        cancel: CancellationToken,
    ) -> Result<PipelineResult, PipelineError> {
        let run = self.execute_run(request, progress, cancel).await?;

        if run.state() != RunState::Completed {
            return Err(PipelineError::from_failed_run(&run));
        }

        self.aggregator.finalize(&run).await.map_err(|e| {
            warn!(run_id = run.id(), "Failed to aggregate result: {}", e);
            PipelineError::Internal {
                run_id: Some(run.id().to_string()),
            }
        })
    }

    /// Gate and orchestrate, returning the terminal run itself.
    ///
    /// Useful when the caller needs the partial stages of a failed run.
    pub async fn execute_run(
        &self,
        request: PipelineRequest,
        progress: &dyn ProgressNotifier,
        cancel: CancellationToken,
    ) -> Result<PipelineRun, PipelineError> {
        let providers = match self.gate.check(&request) {
            GateDecision::Allowed(providers) => providers,
            GateDecision::Rejected(rejection) => {
                info!("Request rejected: {}", rejection);
                return Err(PipelineError::Rejected(rejection));
            }
        };

        Ok(self
            .orchestrator
            .run(request, providers, progress, cancel)
            .await)
    }
}
