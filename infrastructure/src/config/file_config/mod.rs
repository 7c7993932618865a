//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Each section converts into its runtime type together with the issues
//! found on the way, so one pass can report every problem at once.

mod gating;
mod models;
mod output;
mod pipeline;
mod providers;
mod resilience;
mod stages;
mod validation;

pub use gating::FileGatingConfig;
pub use models::FileModelsConfig;
pub use output::{FileOutputConfig, FileOutputFormat};
pub use pipeline::FilePipelineConfig;
pub use providers::{FileProviderConfig, FileProvidersConfig};
pub use resilience::{FileBreakerConfig, FileRetryConfig};
pub use stages::FileStagesConfig;
pub use validation::{ConfigIssue, ConfigIssueCode, Severity};

use serde::{Deserialize, Serialize};
use synthesis_application::PipelineParams;

use super::settings::{ConfigValidationError, PipelineSettings};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Eligibility policy
    pub gating: FileGatingConfig,
    /// Per-stage deadlines
    pub stages: FileStagesConfig,
    /// Call timeout, run deadline, concurrency, peer context
    pub pipeline: FilePipelineConfig,
    pub retry: FileRetryConfig,
    pub circuit_breaker: FileBreakerConfig,
    /// Default models, designated analysts and catalog overrides
    pub models: FileModelsConfig,
    /// Per-family connection settings
    pub providers: FileProvidersConfig,
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        self.convert().1
    }

    /// Convert into runtime settings, failing on any error-severity issue
    ///
    /// Warnings are logged and their fields fall back to clamped values.
    pub fn to_settings(&self) -> Result<PipelineSettings, ConfigValidationError> {
        let (settings, issues) = self.convert();
        let (errors, warnings): (Vec<_>, Vec<_>) =
            issues.into_iter().partition(ConfigIssue::is_error);
        for warning in &warnings {
            tracing::warn!("config: {}", warning);
        }
        if !errors.is_empty() {
            return Err(ConfigValidationError { issues: errors });
        }
        Ok(settings)
    }

    fn convert(&self) -> (PipelineSettings, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        let (policy, i) = self.gating.to_policy();
        issues.extend(i);
        let (stage_timeouts, i) = self.stages.to_timeouts();
        issues.extend(i);
        let (call_timeout, i) = self.pipeline.call_timeout();
        issues.extend(i);
        let (run_timeout, i) = self.pipeline.run_timeout();
        issues.extend(i);
        let (max_concurrent_calls, i) = self.pipeline.parse_max_concurrent_calls();
        issues.extend(i);
        let (peer_context, i) = self.pipeline.parse_peer_context();
        issues.extend(i);
        let (retry, i) = self.retry.to_policy();
        issues.extend(i);
        let (breaker, i) = self.circuit_breaker.to_config();
        issues.extend(i);
        let (catalog, i) = self.models.parse_catalog();
        issues.extend(i);
        let (default_models, i) = self.models.parse_default();
        issues.extend(i);
        let (moderator, i) = self.models.parse_moderator();
        issues.extend(i);
        let (meta_analysis, i) = self.models.parse_meta_analysis();
        issues.extend(i);
        let (synthesizer, i) = self.models.parse_synthesizer();
        issues.extend(i);
        let (output_format, i) = self.output.parse_format();
        issues.extend(i);

        let mut params = PipelineParams::default()
            .with_stage_timeouts(stage_timeouts)
            .with_call_timeout(call_timeout)
            .with_run_timeout(run_timeout)
            .with_max_concurrent_calls(max_concurrent_calls)
            .with_peer_context(peer_context)
            .with_meta_analysis_models(meta_analysis);
        if let Some(model) = moderator {
            params = params.with_moderator(model);
        }
        if let Some(model) = synthesizer {
            params = params.with_synthesizer(model);
        }

        let settings = PipelineSettings {
            policy,
            catalog,
            params,
            retry,
            breaker,
            default_models,
            output_dir: self.output.dir.clone(),
            output_format,
            events_log: self.output.events_log.clone(),
        };
        (settings, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use synthesis_application::PeerContextMode;
    use synthesis_domain::ProviderFamily;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[gating]
min_models = 2
min_provider_families = 2

[stages]
peer_review_timeout_secs = 45

[pipeline]
peer_context = "annotate"
max_concurrent_calls = 4

[retry]
max_attempts = 5

[circuit_breaker]
failure_threshold = 3
cooldown_secs = 10

[models]
default = ["gpt-4o", "claude-sonnet-4", "gemini-2.5-pro"]
moderator = "claude-opus-4"

[models.catalog]
"my-llama" = "meta"

[providers.other]
base_url = "http://localhost:8000/v1"

[output]
format = "markdown"
color = false
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_empty());
        assert!(!config.output.color);

        let settings = config.to_settings().unwrap();
        assert_eq!(settings.policy.min_models, 2);
        assert_eq!(
            settings.params.stage_timeouts.peer_review,
            Duration::from_secs(45)
        );
        assert_eq!(settings.params.peer_context, PeerContextMode::Annotate);
        assert_eq!(settings.params.max_concurrent_calls, 4);
        assert_eq!(settings.params.moderator.as_deref(), Some("claude-opus-4"));
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.breaker.failure_threshold, 3);
        assert_eq!(settings.breaker.cooldown, Duration::from_secs(10));
        assert_eq!(settings.default_models.len(), 3);
        assert_eq!(settings.output_format, FileOutputFormat::Markdown);
        assert_eq!(
            settings.catalog.resolve("my-llama").unwrap().family,
            ProviderFamily::Meta
        );
    }

    #[test]
    fn test_default_config() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());

        let settings = config.to_settings().unwrap();
        assert_eq!(settings.policy.min_models, 3);
        assert_eq!(settings.params, PipelineParams::default());
        assert!(settings.default_models.is_empty());
    }

    #[test]
    fn test_errors_collected_across_sections() {
        let toml_str = r#"
[gating]
min_models = 0

[stages]
meta_analysis_timeout_secs = 0

[circuit_breaker]
failure_threshold = 0

[models.catalog]
"x" = "acme"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();
        assert_eq!(issues.iter().filter(|i| i.is_error()).count(), 4);

        let err = config.to_settings().unwrap_err();
        assert_eq!(err.issues.len(), 4);
        assert!(err.to_string().contains("circuit_breaker.failure_threshold"));
    }

    #[test]
    fn test_largest_toml_timeout_is_rejected() {
        let toml_str = r#"
[stages]
initial_response_timeout_secs = 9223372036854775807

[pipeline]
run_timeout_secs = 9223372036854775807
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let err = config.to_settings().unwrap_err();
        assert_eq!(err.issues.len(), 2);
        assert!(err.to_string().contains("stages.initial_response_timeout_secs"));
        assert!(err.to_string().contains("pipeline.run_timeout_secs"));
    }
}
