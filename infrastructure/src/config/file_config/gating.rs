//! Eligibility policy from TOML (`[gating]` section)

use serde::{Deserialize, Serialize};
use synthesis_domain::{EligibilityPolicy, ProviderFamily};

use super::validation::{ConfigIssue, FAMILY_NAMES};

/// ```toml
/// [gating]
/// min_models = 3
/// min_provider_families = 3
/// major_families = ["openai", "anthropic", "google", "meta", "mistral", "xai", "deepseek"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGatingConfig {
    pub min_models: usize,
    pub min_provider_families: usize,
    pub major_families: Vec<String>,
}

impl Default for FileGatingConfig {
    fn default() -> Self {
        let policy = EligibilityPolicy::default();
        Self {
            min_models: policy.min_models,
            min_provider_families: policy.min_provider_families,
            major_families: policy
                .major_families
                .iter()
                .map(|f| f.as_str().to_string())
                .collect(),
        }
    }
}

impl FileGatingConfig {
    pub fn to_policy(&self) -> (EligibilityPolicy, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        if self.min_models == 0 {
            issues.push(ConfigIssue::zero("gating.min_models"));
        }

        let mut major_families = Vec::new();
        for name in &self.major_families {
            match name.parse::<ProviderFamily>() {
                Ok(family) if !major_families.contains(&family) => major_families.push(family),
                Ok(_) => {}
                Err(_) => issues.push(ConfigIssue::invalid_enum(
                    "gating.major_families",
                    name,
                    &FAMILY_NAMES,
                )),
            }
        }

        let policy = EligibilityPolicy {
            min_models: self.min_models.max(1),
            min_provider_families: self.min_provider_families,
            major_families,
        };
        (policy, issues)
    }
}
