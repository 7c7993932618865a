//! Synthesis pipeline domain
//!
//! A run moves through four fixed [`stage::Stage`]s under the
//! [`state::RunState`] machine, collecting one [`value_objects::StageResult`]
//! per stage and reporting each transition as a [`events::ProgressEvent`].

pub mod entities;
pub mod events;
pub mod result;
pub mod stage;
pub mod state;
pub mod value_objects;
