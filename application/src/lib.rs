//! Application layer for synthesis-pipeline
//!
//! This crate contains use cases, port definitions, the provider gateway
//! and application configuration. It depends only on the domain layer.

pub mod config;
pub mod gateway;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{PeerContextMode, PipelineParams, StageTimeouts};
pub use gateway::{
    BreakerConfig, BreakerRegistry, CallFailure, CallOutcome, CallSuccess, CircuitState,
    ProviderGateway, RetryPolicy,
};
pub use ports::{
    context_resolver::{ContextError, ContextResolver, NoContext, ResolvedDocument},
    progress::{ChannelProgress, CompositeProgress, NoProgress, ProgressNotifier},
    provider_client::{ProviderClient, ProviderError},
    result_store::{PersistenceError, ResultStore},
};
pub use use_cases::finalize::{AggregateError, ResultAggregator};
pub use use_cases::orchestrator::StageOrchestrator;
pub use use_cases::run_pipeline::{PipelineError, RunPipelineUseCase};
