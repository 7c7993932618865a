//! Google Gemini `generateContent` adapter

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use synthesis_application::{ProviderClient, ProviderError};
use synthesis_domain::{Prompt, ProviderFamily};
use tracing::debug;

use super::http::{Endpoint, non_empty, parse_body, post_json};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize, Deserialize, Debug)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize, Debug)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

pub(crate) fn build_request(prompt: &Prompt, max_tokens: u32) -> GenerateRequest {
    let system_instruction = (!prompt.system.is_empty()).then(|| Content {
        role: None,
        parts: vec![Part {
            text: prompt.system.clone(),
        }],
    });
    GenerateRequest {
        system_instruction,
        contents: vec![Content {
            role: Some("user"),
            parts: vec![Part {
                text: prompt.user.clone(),
            }],
        }],
        generation_config: GenerationConfig {
            max_output_tokens: max_tokens,
        },
    }
}

pub(crate) fn parse_response(body: &str) -> Result<String, ProviderError> {
    let response: GenerateResponse = parse_body(body)?;
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    non_empty(text, "candidate")
}

pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: Endpoint,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, endpoint: Endpoint) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::Google
    }

    async fn complete(&self, model: &str, prompt: &Prompt) -> Result<String, ProviderError> {
        let body = build_request(prompt, self.endpoint.max_tokens);
        let path = format!("models/{}:generateContent", model);
        let mut request = self.http.post(self.endpoint.url(&path));
        if let Some(key) = &self.endpoint.api_key {
            request = request.header("x-goog-api-key", key);
        }

        debug!(model, "sending gemini generateContent");
        let text = post_json(request, &body).await?;
        parse_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_shape() {
        let prompt = Prompt::new("be brief", "q");
        let value = serde_json::to_value(build_request(&prompt, 1000)).unwrap();
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "q");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 1000);
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"blue "},{"text":"light"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(parse_response(body).unwrap(), "blue light");
        // blocked prompts come back without content
        assert!(parse_response(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).is_err());
    }
}
