//! Infrastructure layer for synthesis-pipeline
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: HTTP provider clients, file-backed result storage,
//! local document resolution and the JSONL event log. It also owns TOML
//! configuration loading.

pub mod config;
pub mod context;
pub mod logging;
pub mod persistence;
pub mod providers;

pub use config::{ConfigLoader, ConfigValidationError, FileConfig, FileOutputFormat, PipelineSettings};
pub use context::LocalDocumentResolver;
pub use logging::JsonlEventLog;
pub use persistence::{FileResultStore, MarkdownRenderer};
pub use providers::{ProviderSetupError, build_gateway};
