//! Validated runtime settings assembled from the file configuration

use std::path::PathBuf;
use synthesis_application::{BreakerConfig, PipelineParams, RetryPolicy};
use synthesis_domain::{EligibilityPolicy, ModelCatalog};
use thiserror::Error;

use super::file_config::{ConfigIssue, FileOutputFormat};

/// Everything needed to wire a pipeline, in runtime types
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub policy: EligibilityPolicy,
    pub catalog: ModelCatalog,
    pub params: PipelineParams,
    pub retry: RetryPolicy,
    pub breaker: BreakerConfig,
    /// Models used when a request names none
    pub default_models: Vec<String>,
    pub output_dir: PathBuf,
    pub output_format: FileOutputFormat,
    pub events_log: Option<PathBuf>,
}

/// The configuration has at least one error-severity issue
#[derive(Error, Debug, Clone)]
#[error("invalid configuration: {}", format_issues(.issues))]
pub struct ConfigValidationError {
    pub issues: Vec<ConfigIssue>,
}

fn format_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
