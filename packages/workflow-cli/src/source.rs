//! Where a workflow comes from: an exported JSON file or the server.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Select};
use serde::Deserialize;
use server_core::domains::workflows::{WorkflowEdge, WorkflowGraph, WorkflowNode};
use uuid::Uuid;

use crate::api::ServerApi;

pub enum WorkflowSource {
    File(PathBuf),
    Saved(Uuid),
    /// Choose among saved workflows interactively
    Pick,
}

/// A workflow ready to use. `id` is set for saved workflows.
pub struct LoadedWorkflow {
    pub id: Option<Uuid>,
    pub name: String,
    pub graph: WorkflowGraph,
}

/// Exported file: a saved workflow record or a bare `{nodes, edges}` graph.
#[derive(Deserialize)]
struct WorkflowFile {
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    nodes: Vec<WorkflowNode>,
    #[serde(default)]
    edges: Vec<WorkflowEdge>,
}

impl WorkflowSource {
    pub async fn load(self, api: &ServerApi) -> Result<LoadedWorkflow> {
        match self {
            WorkflowSource::File(path) => load_file(&path),
            WorkflowSource::Saved(id) => {
                let workflow = api
                    .workflow(id)
                    .await
                    .with_context(|| format!("Failed to load workflow {}", id))?;
                Ok(LoadedWorkflow {
                    id: Some(workflow.id),
                    name: workflow.name.clone(),
                    graph: workflow.graph(),
                })
            }
            WorkflowSource::Pick => {
                let workflows = api.workflows().await.context("Failed to list workflows")?;
                if workflows.is_empty() {
                    anyhow::bail!("no saved workflows; pass --file to use an exported one");
                }
                let names: Vec<&str> = workflows.iter().map(|w| w.name.as_str()).collect();
                let selection = Select::with_theme(&ColorfulTheme::default())
                    .with_prompt("Which workflow?")
                    .items(&names)
                    .default(0)
                    .interact()?;
                let workflow = &workflows[selection];
                Ok(LoadedWorkflow {
                    id: Some(workflow.id),
                    name: workflow.name.clone(),
                    graph: workflow.graph(),
                })
            }
        }
    }
}

fn load_file(path: &Path) -> Result<LoadedWorkflow> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workflow".to_string());
    parse(&text, name).with_context(|| format!("Invalid workflow file {}", path.display()))
}

fn parse(text: &str, fallback_name: String) -> Result<LoadedWorkflow> {
    let file: WorkflowFile = serde_json::from_str(text)?;
    Ok(LoadedWorkflow {
        id: file.id,
        name: file.name.unwrap_or(fallback_name),
        graph: WorkflowGraph::new(file.nodes, file.edges),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use server_core::domains::workflows::NodeType;

    #[test]
    fn test_parse_saved_record() {
        let id = Uuid::new_v4();
        let text = format!(
            r#"{{
                "id": "{id}",
                "name": "Support",
                "description": null,
                "nodes": [{{"id": "llmEngine-1", "type": "workflowNode",
                    "position": {{"x": 1, "y": 2}},
                    "data": {{"label": "LLM Engine", "type": "llmEngine", "config": {{"model": "openai/gpt-5"}}}}}}],
                "edges": [],
                "created_at": "2025-01-01T00:00:00Z",
                "updated_at": "2025-01-01T00:00:00Z"
            }}"#
        );

        let loaded = parse(&text, "fallback".into()).unwrap();
        assert_eq!(loaded.id, Some(id));
        assert_eq!(loaded.name, "Support");
        assert_eq!(
            loaded.graph.llm_engine().and_then(|c| c.model()),
            Some("openai/gpt-5")
        );
    }

    #[test]
    fn test_parse_bare_graph() {
        let text = r#"{"nodes": [{"id": "q", "type": "userQuery", "data": {"label": "Q", "config": {}}}]}"#;

        let loaded = parse(text, "support-bot".into()).unwrap();
        assert_eq!(loaded.id, None);
        assert_eq!(loaded.name, "support-bot");
        assert!(loaded.graph.first(NodeType::UserQuery).is_some());
    }

    #[test]
    fn test_parse_rejects_unknown_node() {
        let text = r#"{"nodes": [{"id": "x", "type": "webhook", "data": {"config": {}}}]}"#;
        assert!(parse(text, "x".into()).is_err());
    }
}
