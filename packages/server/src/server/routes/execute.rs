use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chat_client::ChatClientError;
use serde_json::{json, Value};
use tracing::error;

use crate::domains::workflows::{execute_workflow, ExecuteRequest};
use crate::server::app::AxumAppState;
use crate::server::error::error_json;

fn execution_failed(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

/// Run a workflow once and return the model's answer.
pub async fn workflow_execute_handler(
    Extension(state): Extension<AxumAppState>,
    Json(body): Json<Value>,
) -> Response {
    let request: ExecuteRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => return execution_failed(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    let default_model = state.deps.models.default_model().to_string();
    match execute_workflow(&state.deps.gateway, &request, &default_model).await {
        Ok(output) => Json(output).into_response(),
        Err(ChatClientError::RateLimited) => {
            error_json(StatusCode::TOO_MANY_REQUESTS, "Rate limits exceeded")
        }
        Err(ChatClientError::QuotaExceeded) => {
            error_json(StatusCode::PAYMENT_REQUIRED, "Payment required")
        }
        Err(ChatClientError::Upstream { status, .. }) => {
            error!(status, "workflow execution failed at gateway");
            execution_failed(StatusCode::INTERNAL_SERVER_ERROR, "AI gateway error")
        }
        Err(e) => {
            error!(error = %e, "workflow execution failed");
            execution_failed(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}
