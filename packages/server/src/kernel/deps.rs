//! Server dependencies for handlers (using traits for testability)
//!
//! This module provides the central dependency container used by all routes.
//! Persistence and file storage sit behind `Base*` traits; the AI gateway is a
//! concrete client pointed at a configurable base URL.

use anyhow::Result;
use async_trait::async_trait;
use chat_client::GatewayClient;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::domains::chat::ModelPolicy;
use crate::domains::documents::{Document, NewDocument};
use crate::domains::workflows::{Workflow, WorkflowInput};
use crate::kernel::{BaseDocumentStore, BaseFileStorage, BaseWorkflowStore};

// =============================================================================
// Postgres stores (implement Base*Store traits)
// =============================================================================

/// Workflow persistence backed by the `workflows` table
#[derive(Clone)]
pub struct PgWorkflowStore(pub PgPool);

#[async_trait]
impl BaseWorkflowStore for PgWorkflowStore {
    async fn list(&self) -> Result<Vec<Workflow>> {
        Workflow::list(&self.0).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Workflow>> {
        Workflow::find_by_id(id, &self.0).await
    }

    async fn create(&self, input: &WorkflowInput) -> Result<Workflow> {
        Workflow::create(input, &self.0).await
    }

    async fn update(&self, id: Uuid, input: &WorkflowInput) -> Result<Option<Workflow>> {
        Workflow::update(id, input, &self.0).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Workflow::delete(id, &self.0).await
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.0).await?;
        Ok(())
    }
}

/// Document persistence backed by the `documents` table
#[derive(Clone)]
pub struct PgDocumentStore(pub PgPool);

#[async_trait]
impl BaseDocumentStore for PgDocumentStore {
    async fn list(&self, workflow_id: Option<Uuid>) -> Result<Vec<Document>> {
        Document::list(workflow_id, &self.0).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>> {
        Document::find_by_id(id, &self.0).await
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Document>> {
        Document::find_by_ids(ids, &self.0).await
    }

    async fn create(&self, input: &NewDocument) -> Result<Document> {
        Document::create(input, &self.0).await
    }

    async fn update_content(&self, id: Uuid, content: &str) -> Result<()> {
        Document::update_content(id, content, &self.0).await
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Document>> {
        Document::delete(id, &self.0).await
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to handlers (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub workflows: Arc<dyn BaseWorkflowStore>,
    pub documents: Arc<dyn BaseDocumentStore>,
    pub storage: Arc<dyn BaseFileStorage>,
    /// Upstream OpenAI-compatible gateway for chat and execution
    pub gateway: GatewayClient,
    /// Allow-list applied to models requested by chat clients
    pub models: ModelPolicy,
}

impl ServerDeps {
    pub fn new(
        workflows: Arc<dyn BaseWorkflowStore>,
        documents: Arc<dyn BaseDocumentStore>,
        storage: Arc<dyn BaseFileStorage>,
        gateway: GatewayClient,
        models: ModelPolicy,
    ) -> Self {
        Self {
            workflows,
            documents,
            storage,
            gateway,
            models,
        }
    }

    /// Production wiring: Postgres stores over one pool
    pub fn postgres(
        pool: PgPool,
        storage: Arc<dyn BaseFileStorage>,
        gateway: GatewayClient,
        models: ModelPolicy,
    ) -> Self {
        Self::new(
            Arc::new(PgWorkflowStore(pool.clone())),
            Arc::new(PgDocumentStore(pool)),
            storage,
            gateway,
            models,
        )
    }
}
