//! Streaming chat relay.
//!
//! Resolves knowledge base documents into the system prompt, then relays the
//! gateway's SSE body to the caller byte for byte.

use axum::{
    body::Body,
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chat_client::{ChatClientError, ChatRequest, CompletionRequest, Message};
use tracing::{error, info, warn};

use crate::domains::chat::augment_system_prompt;
use crate::domains::documents::context::parse_ids;
use crate::domains::documents::{DocumentContext, PdfStrategy};
use crate::server::app::AxumAppState;
use crate::server::error::error_json;

pub async fn workflow_chat_handler(
    Extension(state): Extension<AxumAppState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let deps = &state.deps;
    info!(messages = request.messages.len(), "processing chat request");

    let ids = parse_ids(&request.document_ids);
    let context = DocumentContext::new(
        deps.documents.as_ref(),
        deps.storage.as_ref(),
        PdfStrategy::Readable,
    )
    .build(&ids)
    .await
    .unwrap_or_else(|e| {
        warn!(error = %e, "document lookup failed, continuing without context");
        String::new()
    });

    let system_prompt = augment_system_prompt(request.system_prompt.as_deref(), &context);
    let model = deps.models.resolve(request.model.as_deref()).to_string();

    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    messages.push(Message::system(system_prompt));
    messages.extend(request.messages);

    match deps
        .gateway
        .chat_completion_stream(CompletionRequest::new(model, messages))
        .await
    {
        Ok(stream) => {
            info!("streaming response started");
            (
                [(header::CONTENT_TYPE, "text/event-stream")],
                Body::from_stream(stream),
            )
                .into_response()
        }
        Err(ChatClientError::RateLimited) => error_json(
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limits exceeded, please try again later.",
        ),
        Err(ChatClientError::QuotaExceeded) => {
            error_json(StatusCode::PAYMENT_REQUIRED, "Payment required, please add funds.")
        }
        Err(e) => {
            error!(error = %e, "AI gateway error");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "AI gateway error")
        }
    }
}
