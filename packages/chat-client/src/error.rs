//! Error types for the chat client.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for chat client operations.
pub type Result<T> = std::result::Result<T, ChatClientError>;

/// Fallback shown when a transport failure carries no message of its own.
const UNKNOWN_ERROR: &str = "Unknown error";

/// Chat client errors.
///
/// The `Display` text of every variant is meant to be shown to a user as-is;
/// it is what a session reports through `on_error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatClientError {
    /// Configuration error (missing endpoint or key)
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP 429 from the chat endpoint
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    /// HTTP 402 from the chat endpoint
    #[error("Payment required. Please add credits.")]
    QuotaExceeded,

    /// Non-2xx response or a response without a body
    #[error("Failed to start chat stream")]
    StreamUnavailable,

    /// Connection or read failure while the session was running
    #[error("{0}")]
    Transport(String),

    /// Non-2xx answer from the upstream gateway (other than 429/402)
    #[error("AI gateway error ({status}): {body}")]
    Upstream { status: u16, body: String },

    /// Unexpected response shape from the upstream gateway
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ChatClientError {
    /// Build a transport error, falling back to a generic message when the
    /// underlying error has nothing to say.
    pub fn transport(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::Transport(UNKNOWN_ERROR.to_string())
        } else {
            Self::Transport(message)
        }
    }

    /// Map the statuses that carry their own user-facing message.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        match status {
            StatusCode::TOO_MANY_REQUESTS => Some(Self::RateLimited),
            StatusCode::PAYMENT_REQUIRED => Some(Self::QuotaExceeded),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ChatClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ChatClientError::from_status(StatusCode::TOO_MANY_REQUESTS),
            Some(ChatClientError::RateLimited)
        );
        assert_eq!(
            ChatClientError::from_status(StatusCode::PAYMENT_REQUIRED),
            Some(ChatClientError::QuotaExceeded)
        );
        assert_eq!(ChatClientError::from_status(StatusCode::BAD_GATEWAY), None);
    }

    #[test]
    fn test_empty_transport_message_falls_back() {
        assert_eq!(ChatClientError::transport("  ").to_string(), "Unknown error");
        assert_eq!(
            ChatClientError::transport("connection reset").to_string(),
            "connection reset"
        );
    }
}
