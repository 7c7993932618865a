//! Provider gateway: circuit breaking, retry and timeouts around
//! [`ProviderClient`](crate::ports::provider_client::ProviderClient) calls

pub mod circuit_breaker;
pub mod provider_gateway;
pub mod retry;

pub use circuit_breaker::{
    BreakerConfig, BreakerOpen, BreakerPermit, BreakerRegistry, BreakerSnapshot, CircuitBreaker,
    CircuitState,
};
pub use provider_gateway::{CallFailure, CallOutcome, CallSuccess, ProviderGateway};
pub use retry::{BackoffCalculator, RetryExecutor, RetryPolicy};
