//! OpenAI-compatible chat completions adapter
//!
//! Serves OpenAI itself and every family that exposes the same
//! `/chat/completions` wire format (xAI, DeepSeek, Mistral, Meta's Llama
//! API, self-hosted servers).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use synthesis_application::{ProviderClient, ProviderError};
use synthesis_domain::{Prompt, ProviderFamily};
use tracing::debug;

use super::http::{Endpoint, non_empty, parse_body, post_json};

#[derive(Serialize, Debug)]
pub(crate) struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize, Debug)]
pub(crate) struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    content: Option<String>,
}

pub(crate) fn build_request<'a>(model: &'a str, prompt: &'a Prompt, max_tokens: u32) -> ChatRequest<'a> {
    let mut messages = Vec::with_capacity(2);
    if !prompt.system.is_empty() {
        messages.push(ChatMessage {
            role: "system",
            content: &prompt.system,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: &prompt.user,
    });
    ChatRequest {
        model,
        messages,
        max_tokens,
    }
}

pub(crate) fn parse_response(body: &str) -> Result<String, ProviderError> {
    let response: ChatResponse = parse_body(body)?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();
    non_empty(content, "chat completion")
}

pub struct OpenAiCompatibleClient {
    family: ProviderFamily,
    http: reqwest::Client,
    endpoint: Endpoint,
}

impl OpenAiCompatibleClient {
    pub fn new(family: ProviderFamily, http: reqwest::Client, endpoint: Endpoint) -> Self {
        Self {
            family,
            http,
            endpoint,
        }
    }

    /// Public endpoint for families that speak this protocol
    pub fn default_base_url(family: ProviderFamily) -> Option<&'static str> {
        match family {
            ProviderFamily::OpenAi => Some("https://api.openai.com/v1"),
            ProviderFamily::Xai => Some("https://api.x.ai/v1"),
            ProviderFamily::DeepSeek => Some("https://api.deepseek.com/v1"),
            ProviderFamily::Mistral => Some("https://api.mistral.ai/v1"),
            ProviderFamily::Meta => Some("https://api.llama.com/compat/v1"),
            ProviderFamily::Anthropic | ProviderFamily::Google | ProviderFamily::Other => None,
        }
    }
}

#[async_trait]
impl ProviderClient for OpenAiCompatibleClient {
    fn family(&self) -> ProviderFamily {
        self.family
    }

    async fn complete(&self, model: &str, prompt: &Prompt) -> Result<String, ProviderError> {
        let body = build_request(model, prompt, self.endpoint.max_tokens);
        let mut request = self.http.post(self.endpoint.url("chat/completions"));
        if let Some(key) = &self.endpoint.api_key {
            request = request.bearer_auth(key);
        }

        debug!(family = %self.family, model, "sending chat completion");
        let text = post_json(request, &body).await?;
        parse_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_shape() {
        let prompt = Prompt::new("be brief", "why is the sky blue?");
        let value = serde_json::to_value(build_request("gpt-4o", &prompt, 512)).unwrap();
        assert_eq!(value["model"], "gpt-4o");
        assert_eq!(value["max_tokens"], 512);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][1]["content"], "why is the sky blue?");
    }

    #[test]
    fn test_empty_system_prompt_is_omitted() {
        let prompt = Prompt::new("", "q");
        let value = serde_json::to_value(build_request("m", &prompt, 1)).unwrap();
        assert_eq!(value["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Rayleigh scattering"}}]}"#;
        assert_eq!(parse_response(body).unwrap(), "Rayleigh scattering");

        let empty = r#"{"choices":[]}"#;
        assert!(matches!(
            parse_response(empty),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_default_base_urls() {
        assert!(OpenAiCompatibleClient::default_base_url(ProviderFamily::Xai).is_some());
        assert!(OpenAiCompatibleClient::default_base_url(ProviderFamily::Other).is_none());
    }
}
