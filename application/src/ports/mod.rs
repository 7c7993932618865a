//! Ports (interfaces) for external dependencies
//!
//! These traits define the boundaries between the application layer
//! and the infrastructure layer.

pub mod context_resolver;
pub mod progress;
pub mod provider_client;
pub mod result_store;
