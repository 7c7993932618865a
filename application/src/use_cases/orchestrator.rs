//! Stage orchestrator
//!
//! Drives one accepted request through the four stages. Calls within a
//! stage run concurrently under a per-run ceiling and a per-stage deadline;
//! stages themselves are strictly sequential. All bookkeeping (recording
//! results, moving the state machine, emitting events) happens here, on the
//! single task that owns the run.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use synthesis_domain::{
    FailureReason, ModelCatalog, ModelResponse, PipelineRequest, PipelineRun, Prompt,
    PromptTemplate, ProviderFamily, ProviderIdentity, RunFailure, RunState, Stage, StageResult,
    Transition, TransitionError,
};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::emitter::RunEmitter;
use crate::config::{PeerContextMode, PipelineParams};
use crate::gateway::{CallFailure, CallOutcome, ProviderGateway};
use crate::ports::context_resolver::{ContextResolver, NoContext};
use crate::ports::progress::ProgressNotifier;

/// Unexpected fault inside orchestration.
///
/// Never escapes [`StageOrchestrator::run`]: the run is failed with
/// `internal_error` instead.
#[derive(Error, Debug)]
enum OrchestrationFault {
    #[error("invalid state transition: {0}")]
    Transition(#[from] TransitionError),

    #[error("call task failed: {0}")]
    Join(#[from] JoinError),

    #[error("orchestration panicked: {0}")]
    Panicked(String),
}

struct PlannedCall {
    provider: ProviderIdentity,
    prompt: Prompt,
}

/// Horizon used when `now + timeout` would overflow the clock
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + timeout`, saturating at [`FAR_FUTURE`]
fn instant_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .unwrap_or_else(|| now + FAR_FUTURE)
}

/// The earlier of the stage deadline and the run deadline
#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    reason: FailureReason,
}

impl Deadline {
    fn detail(&self) -> &'static str {
        match self.reason {
            FailureReason::Timeout => "stage deadline exceeded",
            _ => "run deadline exceeded",
        }
    }
}

pub struct StageOrchestrator {
    gateway: Arc<ProviderGateway>,
    catalog: ModelCatalog,
    context: Arc<dyn ContextResolver>,
    params: PipelineParams,
}

impl StageOrchestrator {
    pub fn new(gateway: Arc<ProviderGateway>, catalog: ModelCatalog, params: PipelineParams) -> Self {
        Self {
            gateway,
            catalog,
            context: Arc::new(NoContext),
            params,
        }
    }

    pub fn with_context_resolver(mut self, resolver: Arc<dyn ContextResolver>) -> Self {
        self.context = resolver;
        self
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    pub fn gateway(&self) -> &Arc<ProviderGateway> {
        &self.gateway
    }

    /// Execute a request that already passed the eligibility gate.
    ///
    /// `providers` are the resolved identities in request order. The
    /// returned run is always terminal.
    pub async fn run(
        &self,
        request: PipelineRequest,
        providers: Vec<ProviderIdentity>,
        progress: &dyn ProgressNotifier,
        cancel: CancellationToken,
    ) -> PipelineRun {
        let mut run = PipelineRun::new(request);
        let emitter = RunEmitter::new(run.id(), progress);
        info!(run_id = run.id(), models = providers.len(), "Starting pipeline run");

        let outcome = AssertUnwindSafe(self.drive(&mut run, &providers, &emitter, &cancel))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(OrchestrationFault::Panicked(panic_message(&*panic))));
        if let Err(fault) = outcome {
            warn!(run_id = run.id(), "Pipeline run aborted: {}", fault);
            if !run.state().is_terminal() {
                let stage = run.state().stage();
                // Pending and in-stage runs can always fail
                let _ = run.fail(RunFailure::internal(stage));
            }
        }

        match (run.state(), run.failure()) {
            (RunState::Failed, Some(failure)) => {
                info!(
                    run_id = run.id(),
                    reason = failure.reason_code.as_str(),
                    "Pipeline run failed"
                );
                emitter.run_failed(failure);
            }
            _ => {
                info!(run_id = run.id(), "Pipeline run completed");
                emitter.run_completed(&run);
            }
        }
        run
    }

    async fn drive(
        &self,
        run: &mut PipelineRun,
        providers: &[ProviderIdentity],
        emitter: &RunEmitter<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestrationFault> {
        // A run timeout past the clock's range means no run deadline
        let run_deadline = self.params.run_timeout.and_then(|t| Instant::now().checked_add(t));
        let expired = || cancel.is_cancelled() || run_deadline.is_some_and(|at| Instant::now() >= at);
        let limiter = Arc::new(Semaphore::new(
            self.params.max_concurrent_calls.clamp(1, Semaphore::MAX_PERMITS),
        ));
        let documents = self.resolve_documents(run.request()).await;

        run.transition(Transition::Start)?;

        while let Some(stage) = run.state().stage() {
            if expired() {
                info!(run_id = run.id(), stage = stage.as_str(), "Run cancelled");
                run.fail(RunFailure::cancelled(Some(stage)))?;
                break;
            }

            let calls = self.plan(stage, run, providers, &documents);
            if calls.is_empty() {
                run.fail(RunFailure::stage_failed(stage, "no model designated for this stage"))?;
                break;
            }

            let dispatched: Vec<ProviderIdentity> = calls.iter().map(|c| c.provider.clone()).collect();
            info!(
                run_id = run.id(),
                stage = stage.as_str(),
                calls = calls.len(),
                "Stage {}: {}",
                stage.number(),
                stage.display_name()
            );
            emitter.stage_started(stage, &dispatched);

            let deadline = self.deadline(stage, run_deadline);
            let completions = self
                .dispatch(stage, calls, deadline, &limiter, cancel, emitter)
                .await?;

            let result = StageResult::from_completions(stage, completions);
            emitter.stage_completed(&result);
            let success = result.success;
            let summary = failure_summary(&result);
            run.record_stage(result)?;

            if expired() {
                info!(run_id = run.id(), stage = stage.as_str(), "Run cancelled");
                run.fail(RunFailure::cancelled(Some(stage)))?;
            } else if success {
                run.transition(Transition::StageSucceeded)?;
            } else {
                warn!(run_id = run.id(), stage = stage.as_str(), "Stage failed: {}", summary);
                run.fail(RunFailure::stage_failed(stage, summary))?;
            }
        }

        Ok(())
    }

    async fn resolve_documents(&self, request: &PipelineRequest) -> Vec<(String, String)> {
        if request.documents().is_empty() {
            return Vec::new();
        }
        let resolved = self.context.resolve_all(request.documents()).await;
        debug!(
            requested = request.documents().len(),
            resolved = resolved.len(),
            "Resolved document context"
        );
        resolved.into_iter().map(|d| (d.id, d.content)).collect()
    }

    fn deadline(&self, stage: Stage, run_deadline: Option<Instant>) -> Deadline {
        let stage_at = instant_after(self.params.stage_timeouts.for_stage(stage));
        match run_deadline {
            Some(run_at) if run_at < stage_at => Deadline {
                at: run_at,
                reason: FailureReason::Cancelled,
            },
            _ => Deadline {
                at: stage_at,
                reason: FailureReason::Timeout,
            },
        }
    }

    // ==================== Stage Planning ====================

    fn plan(
        &self,
        stage: Stage,
        run: &PipelineRun,
        providers: &[ProviderIdentity],
        documents: &[(String, String)],
    ) -> Vec<PlannedCall> {
        let query = run.request().query().content();
        match stage {
            Stage::InitialResponse => {
                let prompt = PromptTemplate::initial(query, documents);
                providers
                    .iter()
                    .map(|provider| PlannedCall {
                        provider: provider.clone(),
                        prompt: prompt.clone(),
                    })
                    .collect()
            }
            Stage::PeerReview => {
                let initial = run.stage_result(Stage::InitialResponse);
                let answers = ordered_answers(initial, providers);
                let absent: Vec<String> = match (self.params.peer_context, initial) {
                    (PeerContextMode::Annotate, Some(result)) => providers
                        .iter()
                        .filter(|p| result.failed_models().contains(&p.model.as_str()))
                        .map(|p| p.model.clone())
                        .collect(),
                    _ => Vec::new(),
                };

                answers
                    .iter()
                    .map(|(provider, own)| {
                        let peers: Vec<(String, String)> = answers
                            .iter()
                            .filter(|(other, _)| other != provider)
                            .map(|(other, content)| (other.model.clone(), content.clone()))
                            .collect();
                        PlannedCall {
                            provider: provider.clone(),
                            prompt: PromptTemplate::revision(query, own, &peers, &absent),
                        }
                    })
                    .collect()
            }
            Stage::MetaAnalysis => {
                let revised: Vec<(String, String)> =
                    ordered_answers(run.stage_result(Stage::PeerReview), providers)
                        .into_iter()
                        .map(|(provider, content)| (provider.model, content))
                        .collect();
                let prompt = PromptTemplate::meta_analysis(query, &revised);
                self.meta_analysts(run, providers)
                    .into_iter()
                    .map(|provider| PlannedCall {
                        provider,
                        prompt: prompt.clone(),
                    })
                    .collect()
            }
            Stage::FinalSynthesis => {
                let analysts = self.meta_analysts(run, providers);
                let analyses = ordered_answers(run.stage_result(Stage::MetaAnalysis), &analysts);
                let synthesizer = self
                    .params
                    .synthesizer
                    .as_deref()
                    .or(self.params.moderator.as_deref())
                    .map(|model| self.resolve(model))
                    .or_else(|| analyses.first().map(|(provider, _)| provider.clone()));

                let analyses: Vec<(String, String)> = analyses
                    .into_iter()
                    .map(|(provider, content)| (provider.model, content))
                    .collect();
                synthesizer
                    .map(|provider| PlannedCall {
                        provider,
                        prompt: PromptTemplate::final_synthesis(query, &analyses),
                    })
                    .into_iter()
                    .collect()
            }
        }
    }

    /// Stage 3 models: configured list, else the moderator, else the first
    /// Stage 2 survivor in request order
    fn meta_analysts(&self, run: &PipelineRun, providers: &[ProviderIdentity]) -> Vec<ProviderIdentity> {
        if !self.params.meta_analysis_models.is_empty() {
            let mut analysts: Vec<ProviderIdentity> = Vec::new();
            for model in &self.params.meta_analysis_models {
                let provider = self.resolve(model);
                if !analysts.contains(&provider) {
                    analysts.push(provider);
                }
            }
            return analysts;
        }
        if let Some(moderator) = &self.params.moderator {
            return vec![self.resolve(moderator)];
        }
        ordered_answers(run.stage_result(Stage::PeerReview), providers)
            .into_iter()
            .map(|(provider, _)| provider)
            .take(1)
            .collect()
    }

    /// Designated models outside the catalog are tried as `other`; without
    /// a client for that family the call fails as not configured.
    fn resolve(&self, model: &str) -> ProviderIdentity {
        self.catalog.resolve(model).unwrap_or_else(|| {
            warn!(model, "Designated model is not in the catalog");
            ProviderIdentity::new(model, ProviderFamily::Other)
        })
    }

    // ==================== Dispatch ====================

    async fn dispatch(
        &self,
        stage: Stage,
        calls: Vec<PlannedCall>,
        deadline: Deadline,
        limiter: &Arc<Semaphore>,
        cancel: &CancellationToken,
        emitter: &RunEmitter<'_>,
    ) -> Result<Vec<ModelResponse>, OrchestrationFault> {
        let mut join_set = JoinSet::new();

        for call in calls {
            let gateway = Arc::clone(&self.gateway);
            let limiter = Arc::clone(limiter);
            let cancel = cancel.clone();
            let call_timeout = self.params.call_timeout;

            join_set.spawn(async move {
                let started = Instant::now();
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        Err(CallFailure::new(FailureReason::Cancelled, "run cancelled", 0))
                    }
                    _ = tokio::time::sleep_until(deadline.at) => {
                        Err(CallFailure::new(deadline.reason, deadline.detail(), 0))
                    }
                    outcome = Self::guarded_call(&gateway, &limiter, &call, call_timeout) => outcome,
                };
                let latency_ms = started.elapsed().as_millis() as u64;

                match outcome {
                    Ok(success) => ModelResponse::success(
                        call.provider,
                        stage,
                        success.content,
                        latency_ms,
                        success.attempts,
                    ),
                    Err(failure) => ModelResponse::failure(
                        call.provider,
                        stage,
                        failure.reason,
                        failure.detail,
                        latency_ms,
                        failure.attempts,
                    ),
                }
            });
        }

        let mut completions = Vec::with_capacity(join_set.len());
        while let Some(joined) = join_set.join_next().await {
            let response = joined?;
            if response.is_success() {
                debug!(model = response.model(), stage = stage.as_str(), "Model responded");
            } else {
                warn!(
                    model = response.model(),
                    stage = stage.as_str(),
                    reason = ?response.failure_reason(),
                    "Model failed"
                );
            }
            emitter.model_completed(&response);
            completions.push(response);
        }

        Ok(completions)
    }

    /// One gateway call under the run's concurrency ceiling.
    ///
    /// A panicking provider client fails only its own call.
    async fn guarded_call(
        gateway: &ProviderGateway,
        limiter: &Semaphore,
        call: &PlannedCall,
        call_timeout: Duration,
    ) -> CallOutcome {
        let Ok(_permit) = limiter.acquire().await else {
            return Err(CallFailure::new(
                FailureReason::InternalError,
                "concurrency limiter closed",
                0,
            ));
        };

        match AssertUnwindSafe(gateway.call(&call.provider, &call.prompt, call_timeout))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(CallFailure::new(
                FailureReason::InternalError,
                "provider client panicked",
                0,
            )),
        }
    }
}

/// Best-effort text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Successful `(provider, content)` pairs of a stage, in `order`
fn ordered_answers(
    result: Option<&StageResult>,
    order: &[ProviderIdentity],
) -> Vec<(ProviderIdentity, String)> {
    let Some(result) = result else {
        return Vec::new();
    };
    order
        .iter()
        .filter_map(|provider| {
            result
                .responses
                .iter()
                .find(|r| r.model() == provider.model)
                .and_then(|r| r.content().map(|c| (r.provider.clone(), c.to_string())))
        })
        .collect()
}

fn failure_summary(result: &StageResult) -> String {
    let failures: Vec<String> = result
        .failures
        .iter()
        .map(|r| {
            let reason = r.failure_reason().map(|f| f.as_str()).unwrap_or("unknown");
            format!("{} ({})", r.model(), reason)
        })
        .collect();
    format!(
        "no model produced a response in {}: {}",
        result.stage.display_name(),
        failures.join(", ")
    )
}
