//! Application-level configuration.
//!
//! - [`PipelineParams`]: timeouts, concurrency and stage designations for a run
//! - [`StageTimeouts`]: per-stage deadlines
//! - [`PeerContextMode`]: how Stage 2 prompts treat peers that failed Stage 1

pub mod pipeline_params;

pub use pipeline_params::{PeerContextMode, PipelineParams, StageTimeouts};
