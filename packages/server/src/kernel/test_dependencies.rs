// TestDependencies - in-memory implementations for testing
//
// Provides fake stores and file storage that can be injected into ServerDeps
// for tests, plus call recording for assertions.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chat_client::GatewayClient;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::{BaseDocumentStore, BaseFileStorage, BaseWorkflowStore, ServerDeps};
use crate::domains::chat::ModelPolicy;
use crate::domains::documents::{Document, NewDocument};
use crate::domains::workflows::{Workflow, WorkflowInput};

// =============================================================================
// Memory Workflow Store
// =============================================================================

#[derive(Default)]
pub struct MemoryWorkflowStore {
    workflows: Mutex<Vec<Workflow>>,
}

impl MemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseWorkflowStore for MemoryWorkflowStore {
    async fn list(&self) -> Result<Vec<Workflow>> {
        let mut workflows = self.workflows.lock().unwrap().clone();
        workflows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(workflows)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Workflow>> {
        Ok(self
            .workflows
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.id == id)
            .cloned())
    }

    async fn create(&self, input: &WorkflowInput) -> Result<Workflow> {
        let mut workflows = self.workflows.lock().unwrap();
        // Spread timestamps so ordering is deterministic within one test.
        let now = Utc::now() + Duration::milliseconds(workflows.len() as i64);
        let workflow = Workflow {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            description: input.description.clone(),
            nodes: input.nodes.clone(),
            edges: input.edges.clone(),
            created_at: now,
            updated_at: now,
        };
        workflows.push(workflow.clone());
        Ok(workflow)
    }

    async fn update(&self, id: Uuid, input: &WorkflowInput) -> Result<Option<Workflow>> {
        let mut workflows = self.workflows.lock().unwrap();
        let latest = workflows.iter().map(|w| w.updated_at).max();
        let Some(workflow) = workflows.iter_mut().find(|w| w.id == id) else {
            return Ok(None);
        };
        workflow.name = input.name.clone();
        workflow.description = input.description.clone();
        workflow.nodes = input.nodes.clone();
        workflow.edges = input.edges.clone();
        workflow.updated_at = latest.unwrap_or_else(Utc::now) + Duration::milliseconds(1);
        Ok(Some(workflow.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut workflows = self.workflows.lock().unwrap();
        let before = workflows.len();
        workflows.retain(|w| w.id != id);
        Ok(workflows.len() != before)
    }
}

// =============================================================================
// Memory Document Store
// =============================================================================

#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<Vec<Document>>,
    content_updates: Mutex<Vec<(Uuid, String)>>,
    fail_lookups: bool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `find_by_ids` fail, as if the database were unreachable
    pub fn failing_lookups() -> Self {
        Self {
            fail_lookups: true,
            ..Self::default()
        }
    }

    /// Insert a record directly, bypassing upload
    pub fn insert(&self, input: NewDocument) -> Document {
        let mut documents = self.documents.lock().unwrap();
        let document = Document {
            id: Uuid::new_v4(),
            workflow_id: input.workflow_id,
            name: input.name,
            file_path: input.file_path,
            file_type: input.file_type,
            file_size: input.file_size,
            content: input.content,
            created_at: Utc::now() + Duration::milliseconds(documents.len() as i64),
        };
        documents.push(document.clone());
        document
    }

    /// Content cached through `update_content`, in call order
    pub fn content_updates(&self) -> Vec<(Uuid, String)> {
        self.content_updates.lock().unwrap().clone()
    }

    pub fn get(&self, id: Uuid) -> Option<Document> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }
}

#[async_trait]
impl BaseDocumentStore for MemoryDocumentStore {
    async fn list(&self, workflow_id: Option<Uuid>) -> Result<Vec<Document>> {
        let mut documents: Vec<Document> = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| workflow_id.is_none() || d.workflow_id == workflow_id)
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(documents)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>> {
        Ok(self.get(id))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Document>> {
        if self.fail_lookups {
            anyhow::bail!("document lookup failed");
        }
        Ok(ids.iter().filter_map(|id| self.get(*id)).collect())
    }

    async fn create(&self, input: &NewDocument) -> Result<Document> {
        Ok(self.insert(input.clone()))
    }

    async fn update_content(&self, id: Uuid, content: &str) -> Result<()> {
        self.content_updates
            .lock()
            .unwrap()
            .push((id, content.to_string()));
        if let Some(document) = self.documents.lock().unwrap().iter_mut().find(|d| d.id == id) {
            document.content = Some(content.to_string());
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Document>> {
        let mut documents = self.documents.lock().unwrap();
        let index = documents.iter().position(|d| d.id == id);
        Ok(index.map(|i| documents.remove(i)))
    }
}

// =============================================================================
// Memory File Storage
// =============================================================================

#[derive(Default)]
pub struct MemoryFileStorage {
    files: Mutex<HashMap<String, Bytes>>,
}

impl MemoryFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, bytes: impl Into<Bytes>) -> Self {
        self.files.lock().unwrap().insert(path.to_string(), bytes.into());
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl BaseFileStorage for MemoryFileStorage {
    async fn put(&self, path: &str, bytes: Bytes) -> Result<()> {
        self.files.lock().unwrap().insert(path.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Bytes> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such file: {}", path))
    }

    async fn remove(&self, path: &str) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| anyhow::anyhow!("no such file: {}", path))
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Bundle of in-memory dependencies. Keeps handles to the fakes so tests can
/// seed and inspect them after building `ServerDeps`.
pub struct TestDependencies {
    pub workflows: Arc<MemoryWorkflowStore>,
    pub documents: Arc<MemoryDocumentStore>,
    pub storage: Arc<MemoryFileStorage>,
    pub gateway_url: String,
    pub models: ModelPolicy,
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            workflows: Arc::new(MemoryWorkflowStore::new()),
            documents: Arc::new(MemoryDocumentStore::new()),
            storage: Arc::new(MemoryFileStorage::new()),
            // Nothing listens here; tests that reach the gateway set a mock URL.
            gateway_url: "http://127.0.0.1:9/v1".to_string(),
            models: ModelPolicy::default(),
        }
    }

    pub fn with_gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = url.into();
        self
    }

    pub fn with_documents(mut self, documents: MemoryDocumentStore) -> Self {
        self.documents = Arc::new(documents);
        self
    }

    pub fn with_storage(mut self, storage: MemoryFileStorage) -> Self {
        self.storage = Arc::new(storage);
        self
    }

    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.workflows.clone(),
            self.documents.clone(),
            self.storage.clone(),
            GatewayClient::new("test-key").with_base_url(&self.gateway_url),
            self.models.clone(),
        )
    }
}
