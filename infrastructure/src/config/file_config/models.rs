//! Model selection and catalog from TOML (`[models]` section)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use synthesis_domain::{ModelCatalog, ProviderFamily};

use super::validation::{ConfigIssue, FAMILY_NAMES};

/// ```toml
/// [models]
/// default = ["gpt-4o", "claude-sonnet-4", "gemini-2.5-pro"]
/// moderator = "claude-opus-4"                 # Stages 3 and 4
/// meta_analysis = ["claude-opus-4", "gpt-4o"] # overrides moderator for Stage 3
/// synthesizer = "claude-opus-4"               # overrides moderator for Stage 4
///
/// [models.catalog]
/// "llama-3.3-70b-versatile" = "meta"
/// "my-local-model" = "other"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    /// Models used when a request names none
    pub default: Vec<String>,
    pub moderator: Option<String>,
    pub meta_analysis: Vec<String>,
    pub synthesizer: Option<String>,
    /// Model id -> provider family overrides
    pub catalog: BTreeMap<String, String>,
}

impl FileModelsConfig {
    fn parse_single(field: &str, value: Option<&String>) -> (Option<String>, Vec<ConfigIssue>) {
        match value {
            None => (None, Vec::new()),
            Some(s) if s.trim().is_empty() => (None, vec![ConfigIssue::empty_model(field)]),
            Some(s) => (Some(s.trim().to_string()), Vec::new()),
        }
    }

    fn parse_list(field: &str, values: &[String]) -> (Vec<String>, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let mut models = Vec::new();
        for s in values {
            if s.trim().is_empty() {
                issues.push(ConfigIssue::empty_model(field));
            } else {
                models.push(s.trim().to_string());
            }
        }
        (models, issues)
    }

    pub fn parse_default(&self) -> (Vec<String>, Vec<ConfigIssue>) {
        Self::parse_list("models.default", &self.default)
    }

    pub fn parse_moderator(&self) -> (Option<String>, Vec<ConfigIssue>) {
        Self::parse_single("models.moderator", self.moderator.as_ref())
    }

    pub fn parse_meta_analysis(&self) -> (Vec<String>, Vec<ConfigIssue>) {
        Self::parse_list("models.meta_analysis", &self.meta_analysis)
    }

    pub fn parse_synthesizer(&self) -> (Option<String>, Vec<ConfigIssue>) {
        Self::parse_single("models.synthesizer", self.synthesizer.as_ref())
    }

    pub fn parse_catalog(&self) -> (ModelCatalog, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let mut catalog = ModelCatalog::new();
        for (model, family) in &self.catalog {
            if model.trim().is_empty() {
                issues.push(ConfigIssue::empty_model("models.catalog"));
                continue;
            }
            match family.parse::<ProviderFamily>() {
                Ok(family) => catalog = catalog.with_model(model.trim(), family),
                Err(_) => issues.push(ConfigIssue::invalid_enum(
                    &format!("models.catalog.{}", model),
                    family,
                    &FAMILY_NAMES,
                )),
            }
        }
        (catalog, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_overrides_and_inference() {
        let config: FileModelsConfig = toml::from_str(
            r#"
default = ["gpt-4o", "claude-sonnet-4", "my-llama"]

[catalog]
"my-llama" = "meta"
"#,
        )
        .unwrap();

        let (catalog, issues) = config.parse_catalog();
        assert!(issues.is_empty());
        assert_eq!(catalog.resolve("my-llama").unwrap().family, ProviderFamily::Meta);
        assert_eq!(
            catalog.resolve("claude-sonnet-4").unwrap().family,
            ProviderFamily::Anthropic
        );
        assert_eq!(config.parse_default().0.len(), 3);
    }

    #[test]
    fn test_unknown_family_and_empty_names() {
        let mut config = FileModelsConfig::default();
        config.catalog.insert("x".into(), "acme".into());
        config.moderator = Some("  ".into());
        config.meta_analysis = vec!["gpt-4o".into(), "".into()];

        assert_eq!(config.parse_catalog().1.len(), 1);
        assert_eq!(config.parse_moderator(), (None, vec![ConfigIssue::empty_model("models.moderator")]));
        let (meta, issues) = config.parse_meta_analysis();
        assert_eq!(meta, vec!["gpt-4o"]);
        assert_eq!(issues.len(), 1);
    }
}
