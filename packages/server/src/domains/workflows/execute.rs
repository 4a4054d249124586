//! One-shot workflow execution: a single non-streaming completion built from
//! the graph's knowledge base and LLM engine nodes.

use chat_client::{ChatClientError, CompletionRequest, GatewayClient, Message};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::graph::{WorkflowEdge, WorkflowGraph, WorkflowNode};

/// System prompt used when the LLM engine node has none.
pub const DEFAULT_EXECUTE_PROMPT: &str = "You are a helpful AI assistant.";

/// Output reported when the model returns no content.
pub const EMPTY_OUTPUT: &str = "No response generated";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
    #[serde(default)]
    pub user_input: String,
}

impl ExecuteRequest {
    pub fn graph(&self) -> WorkflowGraph {
        WorkflowGraph::new(self.nodes.clone(), self.edges.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutput {
    pub success: bool,
    pub output: String,
    pub nodes_executed: Vec<String>,
    pub model: String,
}

/// Knowledge base description passed as context, empty without a KB node.
pub fn knowledge_context(graph: &WorkflowGraph) -> String {
    let Some(kb) = graph.knowledge_base() else {
        return String::new();
    };

    let mut context = format!("Knowledge Base: {}\n", kb.name().unwrap_or("Default"));
    if let Some(documents) = kb.documents() {
        context.push_str(&format!("Documents: {}\n", documents));
    }
    context
}

/// Completion request for a run of `graph` on `user_input`.
pub fn completion_request(
    graph: &WorkflowGraph,
    user_input: &str,
    default_model: &str,
) -> CompletionRequest {
    let llm = graph.llm_engine().cloned().unwrap_or_default();

    let mut system = llm
        .system_prompt()
        .unwrap_or(DEFAULT_EXECUTE_PROMPT)
        .to_string();
    let context = knowledge_context(graph);
    if !context.is_empty() {
        system.push_str("\n\nContext:\n");
        system.push_str(&context);
    }

    CompletionRequest::new(
        llm.model().unwrap_or(default_model),
        vec![Message::system(system), Message::user(user_input)],
    )
    .temperature(llm.temperature())
    .max_tokens(llm.max_tokens())
}

/// Run the workflow once against the gateway.
pub async fn execute_workflow(
    gateway: &GatewayClient,
    request: &ExecuteRequest,
    default_model: &str,
) -> Result<ExecutionOutput, ChatClientError> {
    let graph = request.graph();
    info!(nodes = graph.nodes.len(), "executing workflow");

    let completion = completion_request(&graph, &request.user_input, default_model);
    let output = gateway
        .chat_completion(&completion)
        .await?
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| EMPTY_OUTPUT.to_string());

    info!(model = %completion.model, "workflow execution completed");
    Ok(ExecutionOutput {
        success: true,
        output,
        nodes_executed: graph.nodes.iter().map(|n| n.id.clone()).collect(),
        model: completion.model,
    })
}
