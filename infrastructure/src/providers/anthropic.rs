//! Anthropic Messages API adapter

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use synthesis_application::{ProviderClient, ProviderError};
use synthesis_domain::{Prompt, ProviderFamily};
use tracing::debug;

use super::http::{Endpoint, non_empty, parse_body, post_json};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

#[derive(Serialize, Debug)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize, Debug)]
pub(crate) struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize, Debug)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize, Debug)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

pub(crate) fn build_request<'a>(
    model: &'a str,
    prompt: &'a Prompt,
    max_tokens: u32,
) -> MessagesRequest<'a> {
    MessagesRequest {
        model,
        max_tokens,
        system: &prompt.system,
        messages: vec![Message {
            role: "user",
            content: &prompt.user,
        }],
    }
}

/// Concatenates every text block; tool or thinking blocks are ignored
pub(crate) fn parse_response(body: &str) -> Result<String, ProviderError> {
    let response: MessagesResponse = parse_body(body)?;
    let text: String = response
        .content
        .into_iter()
        .filter(|b| b.kind == "text")
        .map(|b| b.text)
        .collect();
    non_empty(text, "message")
}

pub struct AnthropicClient {
    http: reqwest::Client,
    endpoint: Endpoint,
}

impl AnthropicClient {
    pub fn new(http: reqwest::Client, endpoint: Endpoint) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl ProviderClient for AnthropicClient {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::Anthropic
    }

    async fn complete(&self, model: &str, prompt: &Prompt) -> Result<String, ProviderError> {
        let body = build_request(model, prompt, self.endpoint.max_tokens);
        let mut request = self
            .http
            .post(self.endpoint.url("v1/messages"))
            .header("anthropic-version", API_VERSION);
        if let Some(key) = &self.endpoint.api_key {
            request = request.header("x-api-key", key);
        }

        debug!(model, "sending anthropic message");
        let text = post_json(request, &body).await?;
        parse_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_puts_system_at_top_level() {
        let prompt = Prompt::new("be brief", "q");
        let value = serde_json::to_value(build_request("claude-sonnet-4", &prompt, 2048)).unwrap();
        assert_eq!(value["system"], "be brief");
        assert_eq!(value["max_tokens"], 2048);
        assert_eq!(value["messages"].as_array().unwrap().len(), 1);
        assert_eq!(value["messages"][0]["role"], "user");

        let bare = serde_json::to_value(build_request("m", &Prompt::new("", "q"), 1)).unwrap();
        assert!(bare.get("system").is_none());
    }

    #[test]
    fn test_parse_response_joins_text_blocks() {
        let body = r#"{"content":[{"type":"text","text":"Hello, "},{"type":"thinking","thinking":"..."},{"type":"text","text":"world"}],"stop_reason":"end_turn"}"#;
        assert_eq!(parse_response(body).unwrap(), "Hello, world");
        assert!(parse_response(r#"{"content":[]}"#).is_err());
    }
}
