//! Shared HTTP plumbing for the provider adapters

use reqwest::RequestBuilder;
use serde::{Serialize, de::DeserializeOwned};
use synthesis_application::ProviderError;
use synthesis_domain::truncate;

/// Longest error body carried into a `ProviderError`
const MAX_ERROR_BODY: usize = 300;

/// Connection settings resolved for one provider family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, max_tokens: u32) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            max_tokens,
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Send a JSON body and return the raw response text of a 2xx reply
pub(crate) async fn post_json<B: Serialize + ?Sized>(
    request: RequestBuilder,
    body: &B,
) -> Result<String, ProviderError> {
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|e| classify_transport(&e))?;

    let status = response.status();
    let text = response.text().await.map_err(|e| classify_transport(&e))?;
    if !status.is_success() {
        return Err(ProviderError::from_status(
            status.as_u16(),
            truncate(text.trim(), MAX_ERROR_BODY),
        ));
    }
    Ok(text)
}

/// Network-level failures are all transient
pub(crate) fn classify_transport(err: &reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else if let Some(status) = err.status() {
        ProviderError::from_status(status.as_u16(), err.to_string())
    } else if err.is_decode() {
        ProviderError::MalformedResponse(err.to_string())
    } else {
        ProviderError::Connection(err.to_string())
    }
}

pub(crate) fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(format!("{}: {}", e, truncate(body, 120))))
}

/// A 2xx reply that carries no text is as useless as a malformed one
pub(crate) fn non_empty(text: String, what: &str) -> Result<String, ProviderError> {
    if text.trim().is_empty() {
        Err(ProviderError::MalformedResponse(format!("{} contained no text", what)))
    } else {
        Ok(text)
    }
}
