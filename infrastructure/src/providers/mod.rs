//! Provider adapters and gateway assembly
//!
//! One [`ProviderClient`] implementation per wire protocol. The factory reads
//! the `[providers.<family>]` sections, resolves API keys and registers a
//! client for every family that can be reached. Families left out fail their
//! calls as `not_configured` instead of aborting startup.

mod anthropic;
mod gemini;
mod http;
mod openai_compatible;

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use http::Endpoint;
pub use openai_compatible::OpenAiCompatibleClient;

use std::sync::Arc;
use std::time::Duration;
use synthesis_application::{BreakerRegistry, ProviderClient, ProviderGateway, RetryPolicy};
use synthesis_domain::ProviderFamily;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{FileProviderConfig, FileProvidersConfig};

const DEFAULT_MAX_TOKENS: u32 = 4096;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Every family a client can be configured for
pub const ALL_FAMILIES: [ProviderFamily; 8] = [
    ProviderFamily::OpenAi,
    ProviderFamily::Anthropic,
    ProviderFamily::Google,
    ProviderFamily::Meta,
    ProviderFamily::Mistral,
    ProviderFamily::Xai,
    ProviderFamily::DeepSeek,
    ProviderFamily::Other,
];

#[derive(Error, Debug)]
pub enum ProviderSetupError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Environment variable conventionally holding each family's key
pub fn default_api_key_env(family: ProviderFamily) -> Option<&'static str> {
    match family {
        ProviderFamily::OpenAi => Some("OPENAI_API_KEY"),
        ProviderFamily::Anthropic => Some("ANTHROPIC_API_KEY"),
        ProviderFamily::Google => Some("GEMINI_API_KEY"),
        ProviderFamily::Meta => Some("LLAMA_API_KEY"),
        ProviderFamily::Mistral => Some("MISTRAL_API_KEY"),
        ProviderFamily::Xai => Some("XAI_API_KEY"),
        ProviderFamily::DeepSeek => Some("DEEPSEEK_API_KEY"),
        ProviderFamily::Other => None,
    }
}

fn default_base_url(family: ProviderFamily) -> Option<&'static str> {
    match family {
        ProviderFamily::Anthropic => Some(anthropic::DEFAULT_BASE_URL),
        ProviderFamily::Google => Some(gemini::DEFAULT_BASE_URL),
        other => OpenAiCompatibleClient::default_base_url(other),
    }
}

/// Why a family was left without a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skipped {
    Disabled,
    MissingKey(String),
    MissingBaseUrl,
}

impl std::fmt::Display for Skipped {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Skipped::Disabled => write!(f, "disabled in configuration"),
            Skipped::MissingKey(var) => write!(f, "no API key (set {})", var),
            Skipped::MissingBaseUrl => write!(f, "no base_url configured"),
        }
    }
}

/// Resolve the endpoint for one family
///
/// `lookup` reads environment variables; the self-hosted `other` family
/// needs a base URL but no key.
pub fn resolve_endpoint(
    family: ProviderFamily,
    config: &FileProviderConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Endpoint, Skipped> {
    if !config.enabled {
        return Err(Skipped::Disabled);
    }

    let base_url = config
        .base_url
        .clone()
        .or_else(|| default_base_url(family).map(str::to_string))
        .ok_or(Skipped::MissingBaseUrl)?;

    let key_env = config
        .api_key_env
        .as_deref()
        .or_else(|| default_api_key_env(family));
    let api_key = config
        .api_key
        .clone()
        .or_else(|| key_env.and_then(&lookup))
        .filter(|k| !k.trim().is_empty());

    if api_key.is_none() && family != ProviderFamily::Other {
        return Err(Skipped::MissingKey(key_env.unwrap_or("api_key").to_string()));
    }

    Ok(Endpoint::new(
        base_url,
        api_key,
        config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
    ))
}

pub fn build_client(
    family: ProviderFamily,
    http: reqwest::Client,
    endpoint: Endpoint,
) -> Arc<dyn ProviderClient> {
    match family {
        ProviderFamily::Anthropic => Arc::new(AnthropicClient::new(http, endpoint)),
        ProviderFamily::Google => Arc::new(GeminiClient::new(http, endpoint)),
        other => Arc::new(OpenAiCompatibleClient::new(other, http, endpoint)),
    }
}

/// Build a gateway with a client for every reachable family
pub fn build_gateway(
    providers: &FileProvidersConfig,
    breakers: Arc<BreakerRegistry>,
    retry: RetryPolicy,
) -> Result<ProviderGateway, ProviderSetupError> {
    let http = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| ProviderSetupError::HttpClient(e.to_string()))?;

    let mut gateway = ProviderGateway::new(breakers, retry);
    for family in ALL_FAMILIES {
        match resolve_endpoint(family, providers.get(family), |var| std::env::var(var).ok()) {
            Ok(endpoint) => {
                info!(%family, base_url = %endpoint.base_url, "provider configured");
                gateway = gateway.with_client(build_client(family, http.clone(), endpoint));
            }
            Err(Skipped::Disabled) => {}
            Err(Skipped::MissingBaseUrl) if family == ProviderFamily::Other => {}
            Err(reason) => warn!(%family, "provider not available: {}", reason),
        }
    }
    Ok(gateway)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }

    #[test]
    fn test_key_from_default_env_var() {
        let endpoint = resolve_endpoint(
            ProviderFamily::OpenAi,
            &FileProviderConfig::default(),
            env(&[("OPENAI_API_KEY", "sk-test")]),
        )
        .unwrap();
        assert_eq!(endpoint.base_url, "https://api.openai.com/v1");
        assert_eq!(endpoint.api_key.as_deref(), Some("sk-test"));
        assert_eq!(endpoint.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_missing_key_skips_family() {
        let result = resolve_endpoint(ProviderFamily::Anthropic, &FileProviderConfig::default(), env(&[]));
        assert_eq!(result, Err(Skipped::MissingKey("ANTHROPIC_API_KEY".into())));

        let blank = resolve_endpoint(
            ProviderFamily::Anthropic,
            &FileProviderConfig::default(),
            env(&[("ANTHROPIC_API_KEY", "  ")]),
        );
        assert!(blank.is_err());
    }

    #[test]
    fn test_custom_env_var_and_base_url() {
        let config = FileProviderConfig {
            api_key_env: Some("MY_KEY".into()),
            base_url: Some("https://proxy.internal/v1/".into()),
            max_tokens: Some(1024),
            ..Default::default()
        };
        let endpoint = resolve_endpoint(ProviderFamily::Xai, &config, env(&[("MY_KEY", "k")])).unwrap();
        assert_eq!(endpoint.base_url, "https://proxy.internal/v1");
        assert_eq!(endpoint.max_tokens, 1024);
    }

    #[test]
    fn test_other_family_needs_url_not_key() {
        let none = resolve_endpoint(ProviderFamily::Other, &FileProviderConfig::default(), env(&[]));
        assert_eq!(none, Err(Skipped::MissingBaseUrl));

        let config = FileProviderConfig {
            base_url: Some("http://localhost:11434/v1".into()),
            ..Default::default()
        };
        let endpoint = resolve_endpoint(ProviderFamily::Other, &config, env(&[])).unwrap();
        assert!(endpoint.api_key.is_none());
    }

    #[test]
    fn test_disabled_family() {
        let config = FileProviderConfig {
            enabled: false,
            api_key: Some("k".into()),
            ..Default::default()
        };
        assert_eq!(
            resolve_endpoint(ProviderFamily::OpenAi, &config, env(&[])),
            Err(Skipped::Disabled)
        );
    }

    #[test]
    fn test_build_client_routes_by_family() {
        let http = reqwest::Client::new();
        let endpoint = Endpoint::new("http://localhost", None, 16);
        for family in ALL_FAMILIES {
            assert_eq!(build_client(family, http.clone(), endpoint.clone()).family(), family);
        }
    }
}
