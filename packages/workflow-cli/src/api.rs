//! Workflow builder REST client.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use server_core::domains::documents::Document;
use server_core::domains::workflows::{ExecutionOutput, Workflow, WorkflowGraph};
use uuid::Uuid;

pub struct ServerApi {
    http_client: Client,
    base_url: String,
}

impl ServerApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL of the streaming chat endpoint.
    pub fn chat_url(&self) -> String {
        format!("{}/functions/v1/workflow-chat", self.base_url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;
        decode(response).await
    }

    pub async fn workflows(&self) -> Result<Vec<Workflow>> {
        self.get("/api/workflows").await
    }

    pub async fn workflow(&self, id: Uuid) -> Result<Workflow> {
        self.get(&format!("/api/workflows/{}", id)).await
    }

    pub async fn documents(&self, workflow_id: Uuid) -> Result<Vec<Document>> {
        self.get(&format!("/api/documents?workflow_id={}", workflow_id))
            .await
    }

    pub async fn execute(&self, graph: &WorkflowGraph, input: &str) -> Result<ExecutionOutput> {
        let url = format!("{}/functions/v1/workflow-execute", self.base_url);
        debug!(%url, nodes = graph.nodes.len(), "executing workflow");
        let response = self
            .http_client
            .post(&url)
            .json(&json!({
                "nodes": graph.nodes,
                "edges": graph.edges,
                "userInput": input,
            }))
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;
        decode(response).await
    }
}

/// Decode a JSON body, turning `{"error": ...}` responses into errors.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.context("Unexpected response body");
    }

    let body: serde_json::Value = response.json().await.unwrap_or_default();
    let message = body["error"].as_str().unwrap_or("request failed");
    match status {
        StatusCode::NOT_FOUND => anyhow::bail!("not found: {}", message),
        _ => anyhow::bail!("server returned {}: {}", status, message),
    }
}
