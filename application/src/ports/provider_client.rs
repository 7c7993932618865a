//! Provider client port
//!
//! Defines the single capability every LLM provider family implements:
//! issue a prompt, get text back or a classified error.

use async_trait::async_trait;
use synthesis_domain::{FailureReason, Prompt, ProviderFamily};
use thiserror::Error;

/// Errors a provider call can end with
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication failed: {0}")]
    Auth(String),
}

impl ProviderError {
    /// Classify an HTTP error status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            408 => ProviderError::Timeout,
            429 => ProviderError::RateLimited(message),
            401 | 403 => ProviderError::Auth(message),
            500..=599 => ProviderError::Server { status, message },
            _ => ProviderError::InvalidRequest(format!("status {}: {}", status, message)),
        }
    }

    pub fn reason(&self) -> FailureReason {
        match self {
            ProviderError::Timeout => FailureReason::Timeout,
            ProviderError::RateLimited(_) => FailureReason::RateLimited,
            ProviderError::Server { .. } | ProviderError::MalformedResponse(_) => {
                FailureReason::ServerError
            }
            ProviderError::Connection(_) => FailureReason::Connection,
            ProviderError::InvalidRequest(_) => FailureReason::InvalidRequest,
            ProviderError::Auth(_) => FailureReason::AuthFailure,
        }
    }

    /// Transient errors are retried; permanent ones are reported immediately
    pub fn is_transient(&self) -> bool {
        self.reason().is_transient()
    }
}

/// Client for one provider family
///
/// Implementations (adapters) live in the infrastructure layer and are
/// selected by family when the gateway is built.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Family this client serves by default
    fn family(&self) -> ProviderFamily;

    /// Send one prompt to `model` and return the response text
    async fn complete(&self, model: &str, prompt: &Prompt) -> Result<String, ProviderError>;
}
