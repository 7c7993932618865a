//! Retry and circuit breaker settings from TOML
//! (`[retry]` and `[circuit_breaker]` sections)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use synthesis_application::{BreakerConfig, RetryPolicy};

use super::validation::{ConfigIssue, ConfigIssueCode, Severity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetryConfig {
    /// Total attempts per call, including the first
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f32,
    pub jitter_factor: f32,
}

impl Default for FileRetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            initial_backoff_ms: policy.initial_backoff.as_millis() as u64,
            max_backoff_ms: policy.max_backoff.as_millis() as u64,
            backoff_multiplier: policy.multiplier,
            jitter_factor: policy.jitter,
        }
    }
}

impl FileRetryConfig {
    pub fn to_policy(&self) -> (RetryPolicy, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        if self.max_attempts == 0 {
            issues.push(ConfigIssue::zero("retry.max_attempts"));
        }
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            issues.push(ConfigIssue {
                severity: Severity::Warning,
                code: ConfigIssueCode::OutOfRange {
                    field: "retry.jitter_factor".to_string(),
                },
                message: format!(
                    "retry.jitter_factor: {} is outside [0, 1] and will be clamped",
                    self.jitter_factor
                ),
            });
        }

        let policy = RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms.max(self.initial_backoff_ms)),
            multiplier: self.backoff_multiplier,
            jitter: self.jitter_factor.clamp(0.0, 1.0),
        };
        (policy, issues)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBreakerConfig {
    pub failure_threshold: u32,
    pub failure_window_secs: u64,
    pub cooldown_secs: u64,
}

impl Default for FileBreakerConfig {
    fn default() -> Self {
        let config = BreakerConfig::default();
        Self {
            failure_threshold: config.failure_threshold,
            failure_window_secs: config.failure_window.as_secs(),
            cooldown_secs: config.cooldown.as_secs(),
        }
    }
}

impl FileBreakerConfig {
    pub fn to_config(&self) -> (BreakerConfig, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        for (field, value) in [
            ("circuit_breaker.failure_threshold", self.failure_threshold as u64),
            ("circuit_breaker.failure_window_secs", self.failure_window_secs),
            ("circuit_breaker.cooldown_secs", self.cooldown_secs),
        ] {
            if value == 0 {
                issues.push(ConfigIssue::zero(field));
            }
        }

        let config = BreakerConfig {
            failure_threshold: self.failure_threshold.max(1),
            failure_window: Duration::from_secs(self.failure_window_secs.max(1)),
            cooldown: Duration::from_secs(self.cooldown_secs.max(1)),
        };
        (config, issues)
    }
}
