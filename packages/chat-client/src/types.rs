//! Request and response types for the workflow chat endpoint and the
//! upstream gateway.

use serde::{Deserialize, Serialize};

// =============================================================================
// Messages
// =============================================================================

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// Workflow chat request
// =============================================================================

/// Body of a workflow chat request.
///
/// `model` is passed through untouched; the chat handler decides whether it
/// is allowed. `document_ids` are resolved into knowledge base text on the
/// server side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<Message>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub document_ids: Vec<String>,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    /// Add a message to the conversation.
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn document_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.document_ids = ids.into_iter().map(Into::into).collect();
        self
    }
}

// =============================================================================
// Upstream gateway
// =============================================================================

/// OpenAI-compatible completion request sent to the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,

    pub messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            stream: false,
        }
    }

    /// Set temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Ask the gateway for an SSE response.
    pub fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }
}

/// Raw non-streaming response from the gateway (for internal parsing).
#[derive(Debug, Deserialize)]
pub(crate) struct CompletionResponseRaw {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionChoice {
    pub message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_request_wire_format() {
        let req = ChatRequest::new(vec![Message::user("Hi")])
            .system_prompt("Be brief")
            .model("google/gemini-2.5-flash")
            .document_ids(["doc-1", "doc-2"]);

        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "messages": [{"role": "user", "content": "Hi"}],
                "systemPrompt": "Be brief",
                "model": "google/gemini-2.5-flash",
                "documentIds": ["doc-1", "doc-2"],
            })
        );
    }

    #[test]
    fn test_chat_request_omits_absent_fields() {
        let req = ChatRequest::new(vec![Message::user("Hi")]);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"messages": [{"role": "user", "content": "Hi"}]})
        );

        let parsed: ChatRequest = serde_json::from_value(json!({
            "messages": [{"role": "assistant", "content": "Hello"}]
        }))
        .unwrap();
        assert_eq!(parsed.messages, vec![Message::assistant("Hello")]);
        assert!(parsed.document_ids.is_empty());
    }

    #[test]
    fn test_completion_request_stream_flag() {
        let req = CompletionRequest::new("m", vec![Message::system("s")]);
        assert!(serde_json::to_value(&req).unwrap().get("stream").is_none());

        let req = req.streaming().temperature(0.7).max_tokens(1024);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["stream"], true);
        assert_eq!(value["max_tokens"], 1024);
    }
}
