//! Turns orchestration milestones into [`ProgressEvent`]s for one run

use synthesis_domain::{
    ModelResponse, PipelineRun, ProgressEvent, ProviderIdentity, RunFailure, Stage, StageResult,
};
use std::panic::{self, AssertUnwindSafe};
use tracing::{trace, warn};

use super::orchestrator::panic_message;
use crate::ports::progress::ProgressNotifier;

pub struct RunEmitter<'a> {
    run_id: String,
    progress: &'a dyn ProgressNotifier,
}

impl<'a> RunEmitter<'a> {
    pub fn new(run_id: impl Into<String>, progress: &'a dyn ProgressNotifier) -> Self {
        Self {
            run_id: run_id.into(),
            progress,
        }
    }

    /// A panicking subscriber loses the event; the run carries on
    fn emit(&self, event: ProgressEvent) {
        trace!(run_id = %self.run_id, event = event.name(), "Progress event");
        if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| self.progress.emit(&event))) {
            warn!(
                run_id = %self.run_id,
                event = event.name(),
                "Progress subscriber panicked: {}",
                panic_message(&*panic)
            );
        }
    }

    pub fn stage_started(&self, stage: Stage, providers: &[ProviderIdentity]) {
        self.emit(ProgressEvent::StageStarted {
            run_id: self.run_id.clone(),
            stage,
            models: providers.iter().map(|p| p.model.clone()).collect(),
        });
    }

    pub fn model_completed(&self, response: &ModelResponse) {
        self.emit(ProgressEvent::ModelCompleted {
            run_id: self.run_id.clone(),
            stage: response.stage,
            model: response.model().to_string(),
            provider: response.provider.family,
            success: response.is_success(),
            latency_ms: response.latency_ms,
            content: response.content().map(str::to_string),
            reason_code: response.failure_reason(),
        });
    }

    pub fn stage_completed(&self, result: &StageResult) {
        self.emit(ProgressEvent::StageCompleted {
            run_id: self.run_id.clone(),
            stage: result.stage,
            success: result.success,
            succeeded: result.responses.len(),
            failed: result.failures.len(),
        });
    }

    pub fn run_completed(&self, run: &PipelineRun) {
        self.emit(ProgressEvent::RunCompleted {
            run_id: self.run_id.clone(),
            final_answer: run.final_answer().unwrap_or_default().to_string(),
            stages: run.stages().len(),
        });
    }

    pub fn run_failed(&self, failure: &RunFailure) {
        self.emit(ProgressEvent::RunFailed {
            run_id: self.run_id.clone(),
            stage: failure.stage,
            reason_code: failure.reason_code,
            detail: failure.detail.clone(),
        });
    }
}
