//! Provider gateway
//!
//! The only path from the orchestrator to a provider. Each call is checked
//! against its family's circuit breaker, bounded by a per-attempt timeout,
//! retried on transient failures, and reduced to exactly one outcome that is
//! reported back to the breaker.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use synthesis_domain::{FailureReason, Prompt, ProviderFamily, ProviderIdentity};
use tracing::{debug, warn};

use super::circuit_breaker::BreakerRegistry;
use super::retry::{RetryExecutor, RetryPolicy};
use crate::ports::provider_client::{ProviderClient, ProviderError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSuccess {
    pub content: String,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFailure {
    pub reason: FailureReason,
    pub detail: String,
    /// Network attempts made; 0 when short-circuited
    pub attempts: u32,
}

impl CallFailure {
    pub fn new(reason: FailureReason, detail: impl Into<String>, attempts: u32) -> Self {
        Self {
            reason,
            detail: detail.into(),
            attempts,
        }
    }
}

pub type CallOutcome = Result<CallSuccess, CallFailure>;

pub struct ProviderGateway {
    clients: HashMap<ProviderFamily, Arc<dyn ProviderClient>>,
    breakers: Arc<BreakerRegistry>,
    retry: RetryPolicy,
}

impl ProviderGateway {
    pub fn new(breakers: Arc<BreakerRegistry>, retry: RetryPolicy) -> Self {
        Self {
            clients: HashMap::new(),
            breakers,
            retry,
        }
    }

    /// Register a client for the family it reports
    pub fn with_client(self, client: Arc<dyn ProviderClient>) -> Self {
        let family = client.family();
        self.with_client_for(family, client)
    }

    /// Register a client for an explicit family
    ///
    /// Lets one OpenAI-compatible adapter serve several families.
    pub fn with_client_for(mut self, family: ProviderFamily, client: Arc<dyn ProviderClient>) -> Self {
        self.clients.insert(family, client);
        self
    }

    pub fn has_client(&self, family: ProviderFamily) -> bool {
        self.clients.contains_key(&family)
    }

    pub fn families(&self) -> Vec<ProviderFamily> {
        let mut families: Vec<_> = self.clients.keys().copied().collect();
        families.sort();
        families
    }

    pub fn breakers(&self) -> &Arc<BreakerRegistry> {
        &self.breakers
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Make one logical call.
    ///
    /// Dropping the returned future abandons the call; the breaker then
    /// records nothing for it.
    pub async fn call(
        &self,
        provider: &ProviderIdentity,
        prompt: &Prompt,
        attempt_timeout: Duration,
    ) -> CallOutcome {
        let Some(client) = self.clients.get(&provider.family) else {
            return Err(CallFailure::new(
                FailureReason::NotConfigured,
                format!("no client configured for provider family '{}'", provider.family),
                0,
            ));
        };

        let permit = match self.breakers.get(provider.family).try_acquire() {
            Ok(permit) => permit,
            Err(open) => {
                debug!(model = %provider.model, "Short-circuited: {}", open);
                return Err(CallFailure::new(
                    FailureReason::ProviderUnavailable,
                    open.to_string(),
                    0,
                ));
            }
        };

        let model = provider.model.as_str();
        let (result, attempts) = RetryExecutor::run(
            &self.retry,
            |attempt| {
                let client = Arc::clone(client);
                async move {
                    if attempt > 0 {
                        debug!(model, attempt, "Retrying provider call");
                    }
                    match tokio::time::timeout(attempt_timeout, client.complete(model, prompt)).await
                    {
                        Ok(result) => result,
                        Err(_) => Err(ProviderError::Timeout),
                    }
                }
            },
            |result: &Result<String, ProviderError>| {
                result.as_ref().is_err_and(ProviderError::is_transient)
            },
        )
        .await;

        match result {
            Ok(content) => {
                permit.record_success();
                Ok(CallSuccess { content, attempts })
            }
            Err(e) if e.is_transient() => {
                warn!(model, attempts, "Provider call failed: {}", e);
                permit.record_failure();
                Err(CallFailure::new(e.reason(), e.to_string(), attempts))
            }
            Err(e) => {
                warn!(model, "Provider call rejected: {}", e);
                permit.record_neutral();
                Err(CallFailure::new(e.reason(), e.to_string(), attempts))
            }
        }
    }
}
