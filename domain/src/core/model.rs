//! Provider identity value objects
//!
//! A requested model id is resolved to a [`ProviderIdentity`]: the stable
//! model id plus the [`ProviderFamily`] that operates it. Families drive the
//! diversity policy and key the per-provider circuit breakers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

use super::error::DomainError;

/// Provider family operating a model (Value Object)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderFamily {
    OpenAi,
    Anthropic,
    Google,
    Meta,
    Mistral,
    Xai,
    DeepSeek,
    /// Self-hosted or otherwise unlisted endpoints
    Other,
}

impl ProviderFamily {
    /// Families that count towards provider diversity
    pub const MAJOR: [ProviderFamily; 7] = [
        ProviderFamily::OpenAi,
        ProviderFamily::Anthropic,
        ProviderFamily::Google,
        ProviderFamily::Meta,
        ProviderFamily::Mistral,
        ProviderFamily::Xai,
        ProviderFamily::DeepSeek,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderFamily::OpenAi => "openai",
            ProviderFamily::Anthropic => "anthropic",
            ProviderFamily::Google => "google",
            ProviderFamily::Meta => "meta",
            ProviderFamily::Mistral => "mistral",
            ProviderFamily::Xai => "xai",
            ProviderFamily::DeepSeek => "deepseek",
            ProviderFamily::Other => "other",
        }
    }

    pub fn is_major(&self) -> bool {
        Self::MAJOR.contains(self)
    }

    /// Infer the family from well-known model id prefixes
    pub fn infer(model_id: &str) -> Option<Self> {
        let id = model_id.to_ascii_lowercase();
        let family = if id.starts_with("gpt-")
            || id.starts_with("o1")
            || id.starts_with("o3")
            || id.starts_with("o4")
        {
            ProviderFamily::OpenAi
        } else if id.starts_with("claude-") {
            ProviderFamily::Anthropic
        } else if id.starts_with("gemini-") {
            ProviderFamily::Google
        } else if id.starts_with("llama") || id.starts_with("meta-llama") {
            ProviderFamily::Meta
        } else if id.starts_with("mistral-")
            || id.starts_with("mixtral")
            || id.starts_with("codestral")
        {
            ProviderFamily::Mistral
        } else if id.starts_with("grok-") {
            ProviderFamily::Xai
        } else if id.starts_with("deepseek-") {
            ProviderFamily::DeepSeek
        } else {
            return None;
        };
        Some(family)
    }
}

impl std::fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderFamily {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderFamily::OpenAi),
            "anthropic" => Ok(ProviderFamily::Anthropic),
            "google" | "gemini" => Ok(ProviderFamily::Google),
            "meta" => Ok(ProviderFamily::Meta),
            "mistral" => Ok(ProviderFamily::Mistral),
            "xai" => Ok(ProviderFamily::Xai),
            "deepseek" => Ok(ProviderFamily::DeepSeek),
            "other" => Ok(ProviderFamily::Other),
            other => Err(DomainError::UnknownFamily(other.to_string())),
        }
    }
}

impl Serialize for ProviderFamily {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProviderFamily {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A resolved model: stable id plus the family that operates it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderIdentity {
    pub model: String,
    pub family: ProviderFamily,
}

impl ProviderIdentity {
    pub fn new(model: impl Into<String>, family: ProviderFamily) -> Self {
        Self {
            model: model.into(),
            family,
        }
    }
}

impl std::fmt::Display for ProviderIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.model)
    }
}

/// Resolves model ids to provider identities.
///
/// Explicit entries win over prefix inference, so deployments can route
/// custom model names (fine-tunes, self-hosted endpoints) to a family.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    overrides: HashMap<String, ProviderFamily>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>, family: ProviderFamily) -> Self {
        self.overrides.insert(model.into(), family);
        self
    }

    pub fn resolve(&self, model: &str) -> Option<ProviderIdentity> {
        self.overrides
            .get(model)
            .copied()
            .or_else(|| ProviderFamily::infer(model))
            .map(|family| ProviderIdentity::new(model, family))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_inference() {
        assert_eq!(ProviderFamily::infer("gpt-4o"), Some(ProviderFamily::OpenAi));
        assert_eq!(ProviderFamily::infer("o3-mini"), Some(ProviderFamily::OpenAi));
        assert_eq!(
            ProviderFamily::infer("claude-sonnet-4.5"),
            Some(ProviderFamily::Anthropic)
        );
        assert_eq!(
            ProviderFamily::infer("gemini-2.5-pro"),
            Some(ProviderFamily::Google)
        );
        assert_eq!(ProviderFamily::infer("grok-3"), Some(ProviderFamily::Xai));
        assert_eq!(ProviderFamily::infer("my-finetune"), None);
    }

    #[test]
    fn test_family_roundtrip() {
        for family in ProviderFamily::MAJOR {
            let parsed: ProviderFamily = family.as_str().parse().unwrap();
            assert_eq!(parsed, family);
            assert!(family.is_major());
        }
        assert!(!ProviderFamily::Other.is_major());
    }

    #[test]
    fn test_unknown_family_rejected() {
        let err = "acme".parse::<ProviderFamily>().unwrap_err();
        assert_eq!(err, DomainError::UnknownFamily("acme".to_string()));
    }

    #[test]
    fn test_catalog_override_wins() {
        let catalog = ModelCatalog::new()
            .with_model("gpt-oss-local", ProviderFamily::Other)
            .with_model("house-model", ProviderFamily::Mistral);

        assert_eq!(
            catalog.resolve("gpt-oss-local").unwrap().family,
            ProviderFamily::Other
        );
        assert_eq!(
            catalog.resolve("house-model").unwrap().family,
            ProviderFamily::Mistral
        );
        assert_eq!(
            catalog.resolve("gpt-4.1").unwrap().family,
            ProviderFamily::OpenAi
        );
        assert!(catalog.resolve("unheard-of").is_none());
    }

    #[test]
    fn test_family_serde_as_string() {
        let identity = ProviderIdentity::new("claude-opus-4", ProviderFamily::Anthropic);
        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["family"], "anthropic");
        assert_eq!(json["model"], "claude-opus-4");
    }
}
