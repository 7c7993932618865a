//! Pipeline value objects - immutable per-call and per-stage outcomes.
//!
//! - [`ModelResponse`] - one completed (model, stage) attempt, success or terminal failure
//! - [`FailureReason`] - classified failure code, stable on the wire
//! - [`StageResult`] - everything one stage produced, in completion order

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stage::Stage;
use crate::core::model::ProviderIdentity;

/// Classified reason for a failed model call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Attempt or stage deadline exceeded
    Timeout,
    /// Provider throttled the request
    RateLimited,
    /// 5xx-equivalent from the provider
    ServerError,
    /// Network-level failure before a response arrived
    Connection,
    /// Circuit breaker refused the call; no network attempt was made
    ProviderUnavailable,
    /// The provider rejected the request itself
    InvalidRequest,
    /// Credentials missing or refused
    AuthFailure,
    /// No client is configured for the model's provider family
    NotConfigured,
    /// Run deadline or explicit cancellation
    Cancelled,
    /// Unexpected fault inside the pipeline
    InternalError,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Timeout => "timeout",
            FailureReason::RateLimited => "rate_limited",
            FailureReason::ServerError => "server_error",
            FailureReason::Connection => "connection",
            FailureReason::ProviderUnavailable => "provider_unavailable",
            FailureReason::InvalidRequest => "invalid_request",
            FailureReason::AuthFailure => "auth_failure",
            FailureReason::NotConfigured => "not_configured",
            FailureReason::Cancelled => "cancelled",
            FailureReason::InternalError => "internal_error",
        }
    }

    /// Whether a retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FailureReason::Timeout
                | FailureReason::RateLimited
                | FailureReason::ServerError
                | FailureReason::Connection
        )
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a completed call produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResponseOutcome {
    Success { content: String },
    Failure { reason: FailureReason, detail: String },
}

/// A completed (model, stage) attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub provider: ProviderIdentity,
    pub stage: Stage,
    #[serde(flatten)]
    pub outcome: ResponseOutcome,
    /// Wall-clock time from dispatch to completion
    pub latency_ms: u64,
    /// Network attempts made (0 when short-circuited)
    pub attempts: u32,
    pub completed_at: DateTime<Utc>,
}

impl ModelResponse {
    pub fn success(
        provider: ProviderIdentity,
        stage: Stage,
        content: impl Into<String>,
        latency_ms: u64,
        attempts: u32,
    ) -> Self {
        Self {
            provider,
            stage,
            outcome: ResponseOutcome::Success {
                content: content.into(),
            },
            latency_ms,
            attempts,
            completed_at: Utc::now(),
        }
    }

    pub fn failure(
        provider: ProviderIdentity,
        stage: Stage,
        reason: FailureReason,
        detail: impl Into<String>,
        latency_ms: u64,
        attempts: u32,
    ) -> Self {
        Self {
            provider,
            stage,
            outcome: ResponseOutcome::Failure {
                reason,
                detail: detail.into(),
            },
            latency_ms,
            attempts,
            completed_at: Utc::now(),
        }
    }

    pub fn model(&self) -> &str {
        &self.provider.model
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ResponseOutcome::Success { .. })
    }

    pub fn content(&self) -> Option<&str> {
        match &self.outcome {
            ResponseOutcome::Success { content } => Some(content),
            ResponseOutcome::Failure { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        match &self.outcome {
            ResponseOutcome::Success { .. } => None,
            ResponseOutcome::Failure { reason, .. } => Some(*reason),
        }
    }
}

/// Everything one stage produced
///
/// `responses` holds successes and `failures` holds classified failures,
/// each in completion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: Stage,
    pub responses: Vec<ModelResponse>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ModelResponse>,
    pub success: bool,
}

impl StageResult {
    /// Build from completions in the order they arrived
    pub fn from_completions(stage: Stage, completions: Vec<ModelResponse>) -> Self {
        let (responses, failures): (Vec<_>, Vec<_>) =
            completions.into_iter().partition(|r| r.is_success());
        let success = !responses.is_empty();
        Self {
            stage,
            responses,
            failures,
            success,
        }
    }

    /// `(model, content)` pairs of the successful responses
    pub fn contents(&self) -> Vec<(String, String)> {
        self.responses
            .iter()
            .filter_map(|r| r.content().map(|c| (r.model().to_string(), c.to_string())))
            .collect()
    }

    pub fn failed_models(&self) -> Vec<&str> {
        self.failures.iter().map(|r| r.model()).collect()
    }
}
