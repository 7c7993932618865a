//! Pipeline entities: the accepted request and the run that executes it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stage::Stage;
use super::state::{RunState, Transition, TransitionError};
use super::value_objects::StageResult;
use crate::core::query::Query;

/// A caller's request to run the pipeline
///
/// Model ids are kept unique in caller-supplied order; repeats are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRequest {
    query: Query,
    models: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    documents: Vec<String>,
    #[serde(default)]
    persist: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    caller_id: Option<String>,
}

impl PipelineRequest {
    pub fn new<I, S>(query: Query, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for model in models {
            let model = model.into();
            let model = model.trim();
            if !model.is_empty() && !unique.iter().any(|m| m == model) {
                unique.push(model.to_string());
            }
        }
        Self {
            query,
            models: unique,
            documents: Vec::new(),
            persist: false,
            caller_id: None,
        }
    }

    /// Attach opaque document references resolved by the context collaborator
    pub fn with_documents<I, S>(mut self, documents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.documents = documents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub fn with_caller_id(mut self, caller_id: impl Into<String>) -> Self {
        self.caller_id = Some(caller_id.into());
        self
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn persist(&self) -> bool {
        self.persist
    }

    pub fn caller_id(&self) -> Option<&str> {
        self.caller_id.as_deref()
    }
}

/// Why a run ended in [`RunState::Failed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunFailureCode {
    StageFailed,
    Cancelled,
    InternalError,
}

impl RunFailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunFailureCode::StageFailed => "stage_failed",
            RunFailureCode::Cancelled => "cancelled",
            RunFailureCode::InternalError => "internal_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    pub reason_code: RunFailureCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    pub detail: String,
}

impl RunFailure {
    pub fn stage_failed(stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            reason_code: RunFailureCode::StageFailed,
            stage: Some(stage),
            detail: detail.into(),
        }
    }

    pub fn cancelled(stage: Option<Stage>) -> Self {
        Self {
            reason_code: RunFailureCode::Cancelled,
            stage,
            detail: "run deadline exceeded or cancelled".to_string(),
        }
    }

    /// Internal detail is deliberately not carried; callers see a generic message
    pub fn internal(stage: Option<Stage>) -> Self {
        Self {
            reason_code: RunFailureCode::InternalError,
            stage,
            detail: "internal error".to_string(),
        }
    }
}

/// A single pipeline run (Entity)
///
/// Owned by the orchestrator for the run's duration. Stage results can only
/// be appended for the stage the run is currently in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRun {
    id: String,
    request: PipelineRequest,
    state: RunState,
    stages: Vec<StageResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<RunFailure>,
    started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    finished_at: Option<DateTime<Utc>>,
}

impl PipelineRun {
    pub fn new(request: PipelineRequest) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), request)
    }

    pub fn with_id(id: impl Into<String>, request: PipelineRequest) -> Self {
        Self {
            id: id.into(),
            request,
            state: RunState::Pending,
            stages: Vec::new(),
            failure: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn request(&self) -> &PipelineRequest {
        &self.request
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn stages(&self) -> &[StageResult] {
        &self.stages
    }

    pub fn stage_result(&self, stage: Stage) -> Option<&StageResult> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn failure(&self) -> Option<&RunFailure> {
        self.failure.as_ref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// The canonical answer from the final stage
    pub fn final_answer(&self) -> Option<&str> {
        self.stage_result(Stage::FinalSynthesis)
            .and_then(|s| s.responses.first())
            .and_then(|r| r.content())
    }

    pub fn transition(&mut self, transition: Transition) -> Result<RunState, TransitionError> {
        self.state = self.state.apply(transition)?;
        if self.state.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        Ok(self.state)
    }

    /// Record the result of the current stage
    pub fn record_stage(&mut self, result: StageResult) -> Result<(), TransitionError> {
        if self.state.stage() != Some(result.stage) {
            return Err(TransitionError {
                from: self.state,
                transition: Transition::StageSucceeded,
            });
        }
        self.stages.push(result);
        Ok(())
    }

    /// Move to [`RunState::Failed`], keeping the first recorded failure
    pub fn fail(&mut self, failure: RunFailure) -> Result<(), TransitionError> {
        self.transition(Transition::Fail)?;
        self.failure.get_or_insert(failure);
        Ok(())
    }
}
