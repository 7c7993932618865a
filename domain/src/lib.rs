//! Domain layer for synthesis-pipeline
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Pipeline
//!
//! A single query is fanned out to several models from different provider
//! families and consolidated in four stages:
//!
//! 1. **Initial Response**: every requested model answers independently
//! 2. **Peer Review**: each surviving model revises its answer against its peers'
//! 3. **Meta-Analysis**: designated model(s) analyze the revised answers
//! 4. **Final Synthesis**: one terminal call produces the canonical answer
//!
//! ## Gating
//!
//! Before any call, the [`EligibilityGate`] enforces a minimum model count
//! and provider-family diversity.

pub mod core;
pub mod gating;
pub mod pipeline;
pub mod prompt;

// Re-export commonly used types
pub use crate::core::{
    error::DomainError,
    model::{ModelCatalog, ProviderFamily, ProviderIdentity},
    payload::{ErrorPayload, StatusClass},
    query::Query,
    string::truncate,
};
pub use gating::{
    EligibilityGate, EligibilityPolicy, GateDecision, GatingRejection, RejectionCode,
};
pub use pipeline::{
    entities::{PipelineRequest, PipelineRun, RunFailure, RunFailureCode},
    events::{EVENT_SCHEMA_VERSION, ProgressEvent, ProjectionError, RunProjection, StageProjection},
    result::{ArtifactKey, PipelineResult, StorageLocations},
    stage::Stage,
    state::{RunState, Transition, TransitionError},
    value_objects::{FailureReason, ModelResponse, ResponseOutcome, StageResult},
};
pub use prompt::{Prompt, PromptTemplate};
