//! Streaming chat client for workflow chat sessions.
//!
//! Sends a [`ChatRequest`] to the workflow chat endpoint and turns the
//! `text/event-stream` response into assistant text as it arrives.
//!
//! # Example
//!
//! ```rust,ignore
//! use chat_client::{Callbacks, ChatRequest, Message, StreamingChatClient};
//!
//! let client = StreamingChatClient::from_env()?;
//! let request = ChatRequest::new(vec![Message::user("Hi")]);
//!
//! let mut reply = String::new();
//! client
//!     .stream_chat(
//!         &request,
//!         &mut Callbacks::new(
//!             |text| reply.push_str(text),
//!             || {},
//!             |message| eprintln!("chat failed: {message}"),
//!         ),
//!     )
//!     .await;
//! ```
//!
//! The same crate carries [`GatewayClient`], the upstream side used by the
//! chat handler to reach the AI gateway.

pub mod error;
pub mod gateway;
pub mod handler;
pub mod streaming;
pub mod types;

pub use error::{ChatClientError, Result};
pub use gateway::GatewayClient;
pub use handler::{Accumulator, Callbacks, ChatHandler, SessionOutcome};
pub use streaming::{DeltaStream, SseDecoder};
pub use types::*;

use futures::{StreamExt, TryStreamExt};
use reqwest::{header, Client, StatusCode};
use tracing::{debug, warn};

/// Client for the workflow chat endpoint.
///
/// Holds no per-session state; clones share the connection pool and sessions
/// never observe each other.
#[derive(Clone)]
pub struct StreamingChatClient {
    http_client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl StreamingChatClient {
    /// Create a client posting to the given chat endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            endpoint: endpoint.into(),
            api_key: None,
        }
    }

    /// Create from `WORKFLOW_CHAT_URL` and optional `WORKFLOW_CHAT_KEY`.
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("WORKFLOW_CHAT_URL")
            .map_err(|_| ChatClientError::Config("WORKFLOW_CHAT_URL not set".into()))?;
        let client = Self::new(endpoint);
        Ok(match std::env::var("WORKFLOW_CHAT_KEY") {
            Ok(key) => client.with_api_key(key),
            Err(_) => client,
        })
    }

    /// Send a bearer token with every request.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Start a session and return its deltas as a stream.
    ///
    /// Status failures are reported here, before any body is read.
    pub async fn open_stream(&self, request: &ChatRequest) -> Result<DeltaStream> {
        let mut builder = self
            .http_client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {key}"));
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "chat request failed");
            ChatClientError::transport(e.to_string())
        })?;

        let status = response.status();
        if let Some(err) = ChatClientError::from_status(status) {
            warn!(status = %status, "chat endpoint refused request");
            return Err(err);
        }
        if !status.is_success() || status == StatusCode::NO_CONTENT {
            warn!(status = %status, "chat stream unavailable");
            return Err(ChatClientError::StreamUnavailable);
        }

        debug!(messages = request.messages.len(), "chat stream started");
        Ok(DeltaStream::new(
            response.bytes_stream().map_err(ChatClientError::from),
        ))
    }

    /// Run one session, reporting through `handler`.
    ///
    /// Exactly one of `on_done` / `on_error` is called, last. Errors never
    /// escape as values; the returned outcome mirrors the terminal callback.
    pub async fn stream_chat<H>(&self, request: &ChatRequest, handler: &mut H) -> SessionOutcome
    where
        H: ChatHandler + ?Sized,
    {
        let mut stream = match self.open_stream(request).await {
            Ok(stream) => stream,
            Err(e) => return fail(handler, e),
        };

        let mut deltas = 0usize;
        while let Some(item) = stream.next().await {
            match item {
                Ok(delta) => {
                    deltas += 1;
                    handler.on_delta(&delta);
                }
                Err(e) => return fail(handler, e),
            }
        }

        debug!(deltas, "chat stream completed");
        handler.on_done();
        SessionOutcome::Completed
    }

    /// Run one session and return the whole assistant message.
    pub async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let mut stream = self.open_stream(request).await?;
        let mut text = String::new();
        while let Some(delta) = stream.next().await {
            text.push_str(&delta?);
        }
        Ok(text)
    }
}

fn fail<H: ChatHandler + ?Sized>(handler: &mut H, err: ChatClientError) -> SessionOutcome {
    let message = err.to_string();
    warn!(error = %message, "chat session failed");
    handler.on_error(&message);
    SessionOutcome::Failed(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = StreamingChatClient::new("http://localhost:8080/functions/v1/workflow-chat")
            .with_api_key("anon");

        assert_eq!(client.endpoint(), "http://localhost:8080/functions/v1/workflow-chat");
        assert_eq!(client.api_key.as_deref(), Some("anon"));
    }
}
