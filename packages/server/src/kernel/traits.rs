// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like assembling document context) lives in domain functions
// that take these traits.
//
// Naming convention: Base* for trait names (e.g., BaseDocumentStore)

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::domains::documents::{Document, NewDocument};
use crate::domains::workflows::{Workflow, WorkflowInput};

// =============================================================================
// Workflow Store Trait (Infrastructure - persistence)
// =============================================================================

#[async_trait]
pub trait BaseWorkflowStore: Send + Sync {
    /// All workflows, most recently updated first
    async fn list(&self) -> Result<Vec<Workflow>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Workflow>>;

    async fn create(&self, input: &WorkflowInput) -> Result<Workflow>;

    /// Returns None when no workflow has this id
    async fn update(&self, id: Uuid, input: &WorkflowInput) -> Result<Option<Workflow>>;

    /// Returns whether a workflow was deleted
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Cheap round trip to the backing store, used by the health check
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// Document Store Trait (Infrastructure - persistence)
// =============================================================================

#[async_trait]
pub trait BaseDocumentStore: Send + Sync {
    /// Documents for one workflow (or all), newest first
    async fn list(&self, workflow_id: Option<Uuid>) -> Result<Vec<Document>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>>;

    /// Documents in the order of `ids`; unknown ids are skipped
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Document>>;

    async fn create(&self, input: &NewDocument) -> Result<Document>;

    /// Cache extracted text on the record
    async fn update_content(&self, id: Uuid, content: &str) -> Result<()>;

    /// Delete the record, returning it if it existed
    async fn delete(&self, id: Uuid) -> Result<Option<Document>>;
}

// =============================================================================
// File Storage Trait (Infrastructure - document bytes)
// =============================================================================

#[async_trait]
pub trait BaseFileStorage: Send + Sync {
    async fn put(&self, path: &str, bytes: Bytes) -> Result<()>;

    async fn get(&self, path: &str) -> Result<Bytes>;

    async fn remove(&self, path: &str) -> Result<()>;
}
