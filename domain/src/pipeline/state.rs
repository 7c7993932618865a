//! Run state machine
//!
//! ```text
//! Pending -> InitialResponse -> PeerReview -> MetaAnalysis -> FinalSynthesis -> Completed
//!     \________________\______________\_____________\_______________\______> Failed
//! ```
//!
//! The orchestrator only moves a run through [`RunState::apply`], so a stage
//! can be neither skipped nor repeated.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::stage::Stage;

/// Lifecycle state of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Pending,
    InStage(Stage),
    Completed,
    Failed,
}

/// Event driving a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Eligibility passed, enter the first stage
    Start,
    /// The current stage produced at least one success
    StageSucceeded,
    /// Stage failure, cancellation or internal fault
    Fail,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid transition {transition:?} from state {from}")]
pub struct TransitionError {
    pub from: RunState,
    pub transition: Transition,
}

impl RunState {
    pub fn apply(self, transition: Transition) -> Result<RunState, TransitionError> {
        let next = match (self, transition) {
            (RunState::Pending, Transition::Start) => RunState::InStage(Stage::first()),
            (RunState::InStage(stage), Transition::StageSucceeded) => match stage.next() {
                Some(next) => RunState::InStage(next),
                None => RunState::Completed,
            },
            (RunState::Pending | RunState::InStage(_), Transition::Fail) => RunState::Failed,
            (from, transition) => return Err(TransitionError { from, transition }),
        };
        Ok(next)
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            RunState::InStage(stage) => Some(*stage),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Pending => "pending",
            RunState::InStage(stage) => stage.as_str(),
            RunState::Completed => "completed",
            RunState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for RunState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RunState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "pending" => Ok(RunState::Pending),
            "completed" => Ok(RunState::Completed),
            "failed" => Ok(RunState::Failed),
            other => Stage::ALL
                .iter()
                .find(|stage| stage.as_str() == other)
                .map(|stage| RunState::InStage(*stage))
                .ok_or_else(|| serde::de::Error::custom(format!("unknown run state: {other}"))),
        }
    }
}
