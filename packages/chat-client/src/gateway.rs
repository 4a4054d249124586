//! Client for the upstream OpenAI-compatible AI gateway.
//!
//! Used server-side: the chat handler relays [`GatewayClient::chat_completion_stream`]
//! bytes verbatim, and the workflow executor makes one blocking
//! [`GatewayClient::chat_completion`] call.

use bytes::Bytes;
use futures::stream::Stream;
use reqwest::{header, Client, Response};
use tracing::{debug, warn};

use crate::error::{ChatClientError, Result};
use crate::types::{CompletionRequest, CompletionResponseRaw};

/// Default gateway base URL.
pub const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1";

/// Raw upstream SSE bytes, as received.
pub type RawByteStream = std::pin::Pin<Box<dyn Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send>>;

/// OpenAI-compatible gateway client.
#[derive(Clone)]
pub struct GatewayClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl GatewayClient {
    /// Create a new gateway client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_GATEWAY_URL.to_string(),
        }
    }

    /// Create from `AI_GATEWAY_API_KEY` (and optional `AI_GATEWAY_URL`).
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("AI_GATEWAY_API_KEY")
            .map_err(|_| ChatClientError::Config("AI_GATEWAY_API_KEY is not configured".into()))?;
        let client = Self::new(api_key);
        Ok(match std::env::var("AI_GATEWAY_URL") {
            Ok(url) => client.with_base_url(url),
            Err(_) => client,
        })
    }

    /// Set a custom base URL (proxies, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(&self, request: &CompletionRequest) -> Result<Response> {
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "AI gateway request failed");
                ChatClientError::transport(e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if let Some(err) = ChatClientError::from_status(status) {
            warn!(status = %status, "AI gateway refused request");
            return Err(err);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, error = %body, "AI gateway error");
        Err(ChatClientError::Upstream {
            status: status.as_u16(),
            body,
        })
    }

    /// Streaming completion. Returns the gateway's SSE body untouched.
    pub async fn chat_completion_stream(&self, request: CompletionRequest) -> Result<RawByteStream> {
        let request = request.streaming();
        let response = self.post(&request).await?;
        debug!(model = %request.model, "AI gateway stream opened");
        Ok(Box::pin(response.bytes_stream()))
    }

    /// Non-streaming completion. Returns the first choice's content, if any.
    pub async fn chat_completion(&self, request: &CompletionRequest) -> Result<Option<String>> {
        let start = std::time::Instant::now();
        let response = self.post(request).await?;

        let raw: CompletionResponseRaw = response
            .json()
            .await
            .map_err(|e| ChatClientError::Parse(e.to_string()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            "AI gateway completion"
        );

        Ok(raw
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = GatewayClient::new("sk-test").with_base_url("https://custom.api.com/v1/");

        assert_eq!(client.api_key, "sk-test");
        assert_eq!(client.base_url(), "https://custom.api.com/v1");
    }
}
