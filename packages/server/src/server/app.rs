//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName,
    },
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::routes::{
    create_workflow_handler, delete_document_handler, delete_workflow_handler,
    get_workflow_handler, health_handler, list_documents_handler, list_workflows_handler,
    process_documents_handler, update_workflow_handler, upload_document_handler,
    validate_workflow_handler, workflow_chat_handler, workflow_execute_handler,
};

/// Largest accepted request body (document uploads).
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub deps: Arc<ServerDeps>,
}

/// CORS for browser clients: any origin, and the headers the builder sends.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            CONTENT_TYPE,
        ])
}

/// Build the Axum application router
pub fn build_app(deps: ServerDeps) -> Router {
    let state = AxumAppState {
        deps: Arc::new(deps),
    };

    Router::new()
        .route("/health", get(health_handler))
        // Builder functions
        .route("/functions/v1/workflow-chat", post(workflow_chat_handler))
        .route("/functions/v1/workflow-execute", post(workflow_execute_handler))
        .route("/functions/v1/process-documents", post(process_documents_handler))
        // Persistence
        .route(
            "/api/workflows",
            get(list_workflows_handler).post(create_workflow_handler),
        )
        .route("/api/workflows/validate", post(validate_workflow_handler))
        .route(
            "/api/workflows/:id",
            get(get_workflow_handler)
                .put(update_workflow_handler)
                .delete(delete_workflow_handler),
        )
        .route(
            "/api/documents",
            get(list_documents_handler).post(upload_document_handler),
        )
        .route("/api/documents/:id", delete(delete_document_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(Extension(state))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}
