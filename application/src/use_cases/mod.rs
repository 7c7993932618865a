//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod emitter;
pub mod finalize;
pub mod orchestrator;
pub mod run_pipeline;

#[cfg(test)]
pub(crate) mod test_support;
