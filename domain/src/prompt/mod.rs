//! Prompt domain
//!
//! Templates for the system and user prompts sent at each pipeline stage.

mod template;

pub use template::{Prompt, PromptTemplate};
