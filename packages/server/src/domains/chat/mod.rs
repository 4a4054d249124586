//! Chat domain: model selection and system prompt assembly for the streaming
//! chat relay.

pub mod prompt;

pub use prompt::{augment_system_prompt, DEFAULT_CHAT_PROMPT};

/// Model used when the request names none, or one that is not allowed.
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

/// Models the chat relay forwards as-is.
pub const ALLOWED_MODELS: &[&str] = &[
    "google/gemini-2.5-pro",
    "google/gemini-2.5-flash",
    "google/gemini-2.5-flash-lite",
    "openai/gpt-5",
    "openai/gpt-5-mini",
    "openai/gpt-5-nano",
];

/// Allow-list for client-requested models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPolicy {
    allowed: Vec<String>,
    fallback: String,
}

impl Default for ModelPolicy {
    fn default() -> Self {
        Self {
            allowed: ALLOWED_MODELS.iter().map(|m| m.to_string()).collect(),
            fallback: DEFAULT_MODEL.to_string(),
        }
    }
}

impl ModelPolicy {
    pub fn new(allowed: Vec<String>, fallback: impl Into<String>) -> Self {
        Self {
            allowed,
            fallback: fallback.into(),
        }
    }

    pub fn with_default(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn default_model(&self) -> &str {
        &self.fallback
    }

    pub fn is_allowed(&self, model: &str) -> bool {
        self.allowed.iter().any(|m| m == model)
    }

    /// The requested model if it is on the list, otherwise the fallback.
    pub fn resolve<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested.map(str::trim).filter(|m| !m.is_empty()) {
            Some(model) if self.is_allowed(model) => model,
            Some(model) => {
                tracing::warn!(model = %model, fallback = %self.fallback, "model not allowed");
                &self.fallback
            }
            None => &self.fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_model_passes_through() {
        let policy = ModelPolicy::default();
        assert_eq!(policy.resolve(Some("openai/gpt-5-mini")), "openai/gpt-5-mini");
    }

    #[test]
    fn test_unknown_or_missing_model_falls_back() {
        let policy = ModelPolicy::default();
        assert_eq!(policy.resolve(Some("gpt-4")), DEFAULT_MODEL);
        assert_eq!(policy.resolve(Some("  ")), DEFAULT_MODEL);
        assert_eq!(policy.resolve(None), DEFAULT_MODEL);
    }
}
