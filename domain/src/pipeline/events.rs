//! Progress events - the client-facing stream contract.
//!
//! Event and field names are stable: renaming or restructuring any of them
//! requires bumping [`EVENT_SCHEMA_VERSION`].
//!
//! [`RunProjection`] is the receiving side: it folds an event sequence back
//! into per-stage summaries and rejects sequences that are not a valid
//! linearization of stage order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::RunFailureCode;
use super::stage::Stage;
use super::value_objects::FailureReason;
use crate::core::model::ProviderFamily;

pub const EVENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    StageStarted {
        run_id: String,
        stage: Stage,
        /// Models dispatched in this stage, in dispatch order
        models: Vec<String>,
    },
    ModelCompleted {
        run_id: String,
        stage: Stage,
        model: String,
        provider: ProviderFamily,
        success: bool,
        latency_ms: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason_code: Option<FailureReason>,
    },
    StageCompleted {
        run_id: String,
        stage: Stage,
        success: bool,
        succeeded: usize,
        failed: usize,
    },
    RunCompleted {
        run_id: String,
        final_answer: String,
        stages: usize,
    },
    RunFailed {
        run_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stage: Option<Stage>,
        reason_code: RunFailureCode,
        detail: String,
    },
}

impl ProgressEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ProgressEvent::StageStarted { .. } => "stage_started",
            ProgressEvent::ModelCompleted { .. } => "model_completed",
            ProgressEvent::StageCompleted { .. } => "stage_completed",
            ProgressEvent::RunCompleted { .. } => "run_completed",
            ProgressEvent::RunFailed { .. } => "run_failed",
        }
    }

    pub fn run_id(&self) -> &str {
        match self {
            ProgressEvent::StageStarted { run_id, .. }
            | ProgressEvent::ModelCompleted { run_id, .. }
            | ProgressEvent::StageCompleted { run_id, .. }
            | ProgressEvent::RunCompleted { run_id, .. }
            | ProgressEvent::RunFailed { run_id, .. } => run_id,
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            ProgressEvent::StageStarted { stage, .. }
            | ProgressEvent::ModelCompleted { stage, .. }
            | ProgressEvent::StageCompleted { stage, .. } => Some(*stage),
            ProgressEvent::RunFailed { stage, .. } => *stage,
            ProgressEvent::RunCompleted { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::RunCompleted { .. } | ProgressEvent::RunFailed { .. }
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("event {event} for run {got} on projection of run {expected}")]
    WrongRun {
        event: &'static str,
        expected: String,
        got: String,
    },

    #[error("event {event} out of order (open stage: {open:?}, last closed: {closed:?})")]
    OutOfOrder {
        event: &'static str,
        open: Option<Stage>,
        closed: Option<Stage>,
    },

    #[error("event {0} after the run already finished")]
    AfterTerminal(&'static str),
}

/// Per-stage summary reconstructed from events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageProjection {
    pub dispatched: Vec<String>,
    /// `(model, content)` of successful completions, in completion order
    pub responses: Vec<(String, String)>,
    pub failures: Vec<(String, Option<FailureReason>)>,
    pub success: Option<bool>,
}

/// Folds a run's event stream back into its shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunProjection {
    run_id: String,
    open: Option<Stage>,
    closed: Option<Stage>,
    stages: Vec<(Stage, StageProjection)>,
    final_answer: Option<String>,
    failure: Option<(RunFailureCode, String)>,
    finished: bool,
}

impl RunProjection {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            open: None,
            closed: None,
            stages: Vec::new(),
            final_answer: None,
            failure: None,
            finished: false,
        }
    }

    /// Fold every event, stopping at the first ordering violation
    pub fn from_events<'a>(
        run_id: impl Into<String>,
        events: impl IntoIterator<Item = &'a ProgressEvent>,
    ) -> Result<Self, ProjectionError> {
        let mut projection = Self::new(run_id);
        for event in events {
            projection.apply(event)?;
        }
        Ok(projection)
    }

    pub fn apply(&mut self, event: &ProgressEvent) -> Result<(), ProjectionError> {
        let name = event.name();
        if event.run_id() != self.run_id {
            return Err(ProjectionError::WrongRun {
                event: name,
                expected: self.run_id.clone(),
                got: event.run_id().to_string(),
            });
        }
        if self.finished {
            return Err(ProjectionError::AfterTerminal(name));
        }
        let out_of_order = ProjectionError::OutOfOrder {
            event: name,
            open: self.open,
            closed: self.closed,
        };

        match event {
            ProgressEvent::StageStarted { stage, models, .. } => {
                if self.open.is_some() || self.next_stage() != Some(*stage) {
                    return Err(out_of_order);
                }
                self.open = Some(*stage);
                self.stages.push((
                    *stage,
                    StageProjection {
                        dispatched: models.clone(),
                        ..Default::default()
                    },
                ));
            }
            ProgressEvent::ModelCompleted {
                stage,
                model,
                success,
                content,
                reason_code,
                ..
            } => {
                if self.open != Some(*stage) {
                    return Err(out_of_order);
                }
                let current = self.current_mut();
                if *success {
                    current
                        .responses
                        .push((model.clone(), content.clone().unwrap_or_default()));
                } else {
                    current.failures.push((model.clone(), *reason_code));
                }
            }
            ProgressEvent::StageCompleted { stage, success, .. } => {
                if self.open != Some(*stage) {
                    return Err(out_of_order);
                }
                self.current_mut().success = Some(*success);
                self.open = None;
                self.closed = Some(*stage);
            }
            ProgressEvent::RunCompleted { final_answer, .. } => {
                if self.open.is_some() || self.closed != Some(Stage::FinalSynthesis) {
                    return Err(out_of_order);
                }
                self.final_answer = Some(final_answer.clone());
                self.finished = true;
            }
            ProgressEvent::RunFailed {
                stage,
                reason_code,
                detail,
                ..
            } => {
                // A run fails inside its open stage, or between stages at the
                // last closed one or the one about to start
                let valid = match self.open {
                    Some(open) => *stage == Some(open),
                    None => *stage == self.closed || (stage.is_some() && *stage == self.next_stage()),
                };
                if !valid {
                    return Err(out_of_order);
                }
                self.failure = Some((*reason_code, detail.clone()));
                self.open = None;
                self.finished = true;
            }
        }
        Ok(())
    }

    fn next_stage(&self) -> Option<Stage> {
        match self.closed {
            None => Some(Stage::first()),
            Some(closed) => closed.next(),
        }
    }

    fn current_mut(&mut self) -> &mut StageProjection {
        // Callers check that a stage is open, and an open stage was pushed last
        let last = self.stages.len() - 1;
        &mut self.stages[last].1
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn stages(&self) -> &[(Stage, StageProjection)] {
        &self.stages
    }

    pub fn final_answer(&self) -> Option<&str> {
        self.final_answer.as_deref()
    }

    pub fn failure(&self) -> Option<&(RunFailureCode, String)> {
        self.failure.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
