use axum::{
    extract::{Extension, Multipart, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::domains::documents::context::parse_ids;
use crate::domains::documents::{
    delete_document, upload_document, Document, DocumentContext, PdfStrategy, Upload,
};
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;

// =============================================================================
// Document processing
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDocumentsRequest {
    #[serde(default)]
    pub document_ids: Vec<String>,
}

/// Extract and concatenate text for the given documents.
pub async fn process_documents_handler(
    Extension(state): Extension<AxumAppState>,
    Json(request): Json<ProcessDocumentsRequest>,
) -> Response {
    if request.document_ids.is_empty() {
        return Json(json!({ "content": "" })).into_response();
    }

    let deps = &state.deps;
    let ids = parse_ids(&request.document_ids);
    info!(documents = ids.len(), "processing documents");

    match DocumentContext::new(
        deps.documents.as_ref(),
        deps.storage.as_ref(),
        PdfStrategy::TextObjects,
    )
    .build(&ids)
    .await
    {
        Ok(content) => {
            info!(content_len = content.len(), "documents processed");
            Json(json!({ "content": content.trim() })).into_response()
        }
        Err(e) => {
            error!(error = %e, "document processing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string(), "content": "" })),
            )
                .into_response()
        }
    }
}

// =============================================================================
// Document records
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    pub workflow_id: Option<Uuid>,
}

pub async fn list_documents_handler(
    Extension(state): Extension<AxumAppState>,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(state.deps.documents.list(query.workflow_id).await?))
}

/// Multipart upload: a `file` part and an optional `workflow_id` part.
pub async fn upload_document_handler(
    Extension(state): Extension<AxumAppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    let mut file = None;
    let mut workflow_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(str::to_owned)
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| ApiError::BadRequest("file part has no file name".into()))?;
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                file = Some((file_name, content_type, bytes));
            }
            Some("workflow_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                let text = text.trim();
                if !text.is_empty() {
                    let id = Uuid::parse_str(text)
                        .map_err(|_| ApiError::BadRequest(format!("invalid workflow_id: {}", text)))?;
                    workflow_id = Some(id);
                }
            }
            _ => {}
        }
    }

    let (name, content_type, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("missing file part".into()))?;
    let upload = Upload {
        name,
        content_type,
        bytes,
        workflow_id,
    };

    let document = upload_document(
        upload,
        state.deps.documents.as_ref(),
        state.deps.storage.as_ref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn delete_document_handler(
    Extension(state): Extension<AxumAppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match delete_document(id, state.deps.documents.as_ref(), state.deps.storage.as_ref()).await? {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ApiError::NotFound(format!("document {} not found", id))),
    }
}
