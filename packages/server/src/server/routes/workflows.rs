use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::domains::workflows::{Workflow, WorkflowGraph, WorkflowInput};
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;

fn not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("workflow {} not found", id))
}

fn check_name(input: &WorkflowInput) -> Result<(), ApiError> {
    if input.name.trim().is_empty() {
        return Err(ApiError::BadRequest("workflow name is required".into()));
    }
    Ok(())
}

pub async fn list_workflows_handler(
    Extension(state): Extension<AxumAppState>,
) -> Result<Json<Vec<Workflow>>, ApiError> {
    Ok(Json(state.deps.workflows.list().await?))
}

pub async fn get_workflow_handler(
    Extension(state): Extension<AxumAppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Workflow>, ApiError> {
    state
        .deps
        .workflows
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

pub async fn create_workflow_handler(
    Extension(state): Extension<AxumAppState>,
    Json(input): Json<WorkflowInput>,
) -> Result<(StatusCode, Json<Workflow>), ApiError> {
    check_name(&input)?;
    let workflow = state.deps.workflows.create(&input).await?;
    info!(workflow_id = %workflow.id, nodes = workflow.nodes.len(), "workflow saved");
    Ok((StatusCode::CREATED, Json(workflow)))
}

pub async fn update_workflow_handler(
    Extension(state): Extension<AxumAppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<WorkflowInput>,
) -> Result<Json<Workflow>, ApiError> {
    check_name(&input)?;
    let workflow = state
        .deps
        .workflows
        .update(id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    info!(workflow_id = %id, "workflow updated");
    Ok(Json(workflow))
}

pub async fn delete_workflow_handler(
    Extension(state): Extension<AxumAppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.deps.workflows.delete(id).await? {
        info!(workflow_id = %id, "workflow deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Check a graph before running it.
pub async fn validate_workflow_handler(
    Json(graph): Json<WorkflowGraph>,
) -> Json<ValidationResponse> {
    let errors = graph.validate();
    Json(ValidationResponse {
        valid: errors.is_empty(),
        errors,
    })
}
