//! Provider configuration from TOML (`[providers.<family>]` sections)

use serde::{Deserialize, Serialize};
use synthesis_domain::ProviderFamily;

/// Connection settings for one provider family
///
/// ```toml
/// [providers.openai]
/// api_key_env = "OPENAI_API_KEY"
///
/// [providers.other]
/// base_url = "http://localhost:11434/v1"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    pub enabled: bool,
    /// Overrides the family's public endpoint
    pub base_url: Option<String>,
    /// Environment variable holding the API key (family default when unset)
    pub api_key_env: Option<String>,
    /// Direct API key (prefer the environment variable)
    pub api_key: Option<String>,
    /// Max tokens per response
    pub max_tokens: Option<u32>,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            api_key_env: None,
            api_key: None,
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    pub openai: FileProviderConfig,
    pub anthropic: FileProviderConfig,
    pub google: FileProviderConfig,
    pub meta: FileProviderConfig,
    pub mistral: FileProviderConfig,
    pub xai: FileProviderConfig,
    pub deepseek: FileProviderConfig,
    pub other: FileProviderConfig,
}

impl FileProvidersConfig {
    pub fn get(&self, family: ProviderFamily) -> &FileProviderConfig {
        match family {
            ProviderFamily::OpenAi => &self.openai,
            ProviderFamily::Anthropic => &self.anthropic,
            ProviderFamily::Google => &self.google,
            ProviderFamily::Meta => &self.meta,
            ProviderFamily::Mistral => &self.mistral,
            ProviderFamily::Xai => &self.xai,
            ProviderFamily::DeepSeek => &self.deepseek,
            ProviderFamily::Other => &self.other,
        }
    }
}
