/// System prompt used when the chat request carries none.
pub const DEFAULT_CHAT_PROMPT: &str =
    "You are a helpful AI assistant. Keep answers clear and concise.";

/// Request prompt (or the default) followed by the knowledge base section
/// when there is document context.
pub fn augment_system_prompt(requested: Option<&str>, context: &str) -> String {
    let mut prompt = requested
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_CHAT_PROMPT)
        .to_string();

    if !context.is_empty() {
        prompt.push_str(
            "\n\n## Knowledge Base Documents\nUse the following document content to answer questions:\n",
        );
        prompt.push_str(context);
    }

    prompt
}
