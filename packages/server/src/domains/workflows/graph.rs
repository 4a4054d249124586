//! Typed workflow graph.
//!
//! The builder UI stores nodes in react-flow shape:
//! `{id, type: "workflowNode", position, data: {label, type, config, isConfigured}}`.
//! The execute endpoint receives a flatter shape where the node kind sits in
//! the top-level `type` and `data` only has `{label, config}`. Both decode into
//! [`WorkflowNode`]; each node kind gets its own config record instead of a
//! free-form map.

use std::fmt;
use std::str::FromStr;

use chat_client::{ChatRequest, Message};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// React-flow node type used for every node the builder creates.
const CANVAS_NODE_TYPE: &str = "workflowNode";

// =============================================================================
// Node kinds
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    UserQuery,
    KnowledgeBase,
    LlmEngine,
    Output,
}

impl NodeType {
    pub const ALL: [NodeType; 4] = [
        NodeType::UserQuery,
        NodeType::KnowledgeBase,
        NodeType::LlmEngine,
        NodeType::Output,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::UserQuery => "userQuery",
            NodeType::KnowledgeBase => "knowledgeBase",
            NodeType::LlmEngine => "llmEngine",
            NodeType::Output => "output",
        }
    }

    /// Display label the builder gives new nodes.
    pub fn label(&self) -> &'static str {
        match self {
            NodeType::UserQuery => "User Query",
            NodeType::KnowledgeBase => "Knowledge Base",
            NodeType::LlmEngine => "LLM Engine",
            NodeType::Output => "Output",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown node type: {}", s))
    }
}

// =============================================================================
// Node configs
// =============================================================================

/// Accept a number, a numeric string (form inputs store text), or a bool
/// string. Anything else, including `""`, reads as unset.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s.trim().parse().ok(),
        Value::Null => None,
        other => serde_json::from_value(other).ok(),
    })
}

/// Treat empty strings the way the builder does: as unset.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQueryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-text description of attached documents, used by the executor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<u32>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub pass_context: Option<bool>,
}

impl KnowledgeBaseConfig {
    /// Whether document ids go along with chat requests. Defaults to true.
    pub fn passes_context(&self) -> bool {
        self.pass_context.unwrap_or(true)
    }

    pub fn name(&self) -> Option<&str> {
        non_empty(&self.name)
    }

    pub fn documents(&self) -> Option<&str> {
        non_empty(&self.documents)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmEngineConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub enable_web_search: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl LlmEngineConfig {
    pub fn model(&self) -> Option<&str> {
        non_empty(&self.model)
    }

    pub fn system_prompt(&self) -> Option<&str> {
        non_empty(&self.system_prompt)
    }

    /// Sampling temperature; zero or unset falls back to 0.7.
    pub fn temperature(&self) -> f32 {
        self.temperature.filter(|t| *t != 0.0).unwrap_or(0.7)
    }

    /// Completion budget; zero or unset falls back to 1024.
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.filter(|n| *n != 0).unwrap_or(1024)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub stream_response: Option<bool>,
}

/// Config of one node, by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeConfig {
    UserQuery(UserQueryConfig),
    KnowledgeBase(KnowledgeBaseConfig),
    LlmEngine(LlmEngineConfig),
    Output(OutputConfig),
}

impl NodeConfig {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeConfig::UserQuery(_) => NodeType::UserQuery,
            NodeConfig::KnowledgeBase(_) => NodeType::KnowledgeBase,
            NodeConfig::LlmEngine(_) => NodeType::LlmEngine,
            NodeConfig::Output(_) => NodeType::Output,
        }
    }

    /// Form defaults the builder fills in for a freshly dropped node.
    pub fn defaults(node_type: NodeType) -> Self {
        match node_type {
            NodeType::UserQuery => NodeConfig::UserQuery(UserQueryConfig {
                placeholder: Some("Enter your query here...".into()),
                max_length: Some(1000),
            }),
            NodeType::KnowledgeBase => NodeConfig::KnowledgeBase(KnowledgeBaseConfig {
                embedding_model: Some("openai".into()),
                chunk_size: Some(500),
                top_k: Some(5),
                pass_context: Some(true),
                ..Default::default()
            }),
            NodeType::LlmEngine => NodeConfig::LlmEngine(LlmEngineConfig {
                model: Some("gpt-4".into()),
                system_prompt: Some(
                    "You are a helpful assistant that answers questions accurately and concisely."
                        .into(),
                ),
                temperature: Some(0.7),
                enable_web_search: Some(false),
                max_tokens: None,
            }),
            NodeType::Output => NodeConfig::Output(OutputConfig {
                format: Some("markdown".into()),
                stream_response: Some(true),
            }),
        }
    }

    fn decode(node_type: NodeType, config: Value) -> serde_json::Result<Self> {
        let config = match config {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        Ok(match node_type {
            NodeType::UserQuery => NodeConfig::UserQuery(serde_json::from_value(config)?),
            NodeType::KnowledgeBase => NodeConfig::KnowledgeBase(serde_json::from_value(config)?),
            NodeType::LlmEngine => NodeConfig::LlmEngine(serde_json::from_value(config)?),
            NodeType::Output => NodeConfig::Output(serde_json::from_value(config)?),
        })
    }

    fn encode(&self) -> Value {
        let encoded = match self {
            NodeConfig::UserQuery(c) => serde_json::to_value(c),
            NodeConfig::KnowledgeBase(c) => serde_json::to_value(c),
            NodeConfig::LlmEngine(c) => serde_json::to_value(c),
            NodeConfig::Output(c) => serde_json::to_value(c),
        };
        encoded.unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

// =============================================================================
// Nodes and edges
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// One node on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub struct WorkflowNode {
    pub id: String,
    pub position: Position,
    pub label: String,
    pub config: NodeConfig,
    pub is_configured: bool,
}

impl WorkflowNode {
    pub fn node_type(&self) -> NodeType {
        self.config.node_type()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RawNode {
    id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    node_type: Option<String>,
    #[serde(default)]
    position: Position,
    data: RawNodeData,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNodeData {
    #[serde(default)]
    label: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    node_type: Option<NodeType>,
    #[serde(default)]
    config: Value,
    #[serde(default)]
    is_configured: bool,
}

impl TryFrom<RawNode> for WorkflowNode {
    type Error = anyhow::Error;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let node_type = match (raw.data.node_type, raw.node_type.as_deref()) {
            (Some(t), _) => t,
            (None, Some(t)) => t.parse()?,
            (None, None) => anyhow::bail!("node {} has no type", raw.id),
        };
        let config = NodeConfig::decode(node_type, raw.data.config)
            .map_err(|e| anyhow::anyhow!("invalid config for node {}: {}", raw.id, e))?;

        Ok(Self {
            id: raw.id,
            position: raw.position,
            label: raw.data.label,
            config,
            is_configured: raw.data.is_configured,
        })
    }
}

impl From<WorkflowNode> for RawNode {
    fn from(node: WorkflowNode) -> Self {
        RawNode {
            id: node.id,
            node_type: Some(CANVAS_NODE_TYPE.to_string()),
            position: node.position,
            data: RawNodeData {
                label: node.label,
                node_type: Some(node.config.node_type()),
                config: node.config.encode(),
                is_configured: node.is_configured,
            },
        }
    }
}

/// A connection between two nodes. React-flow extras (handles, styling) are
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkflowEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("reactflow__edge-{}-{}", source, target),
            source,
            target,
            extra: Map::new(),
        }
    }

    fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

// =============================================================================
// Graph
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
}

impl WorkflowGraph {
    pub fn new(nodes: Vec<WorkflowNode>, edges: Vec<WorkflowEdge>) -> Self {
        Self { nodes, edges }
    }

    /// First node of the given kind, in canvas order.
    pub fn first(&self, node_type: NodeType) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.node_type() == node_type)
    }

    pub fn user_query(&self) -> Option<&UserQueryConfig> {
        self.nodes.iter().find_map(|n| match &n.config {
            NodeConfig::UserQuery(c) => Some(c),
            _ => None,
        })
    }

    pub fn knowledge_base(&self) -> Option<&KnowledgeBaseConfig> {
        self.nodes.iter().find_map(|n| match &n.config {
            NodeConfig::KnowledgeBase(c) => Some(c),
            _ => None,
        })
    }

    pub fn llm_engine(&self) -> Option<&LlmEngineConfig> {
        self.nodes.iter().find_map(|n| match &n.config {
            NodeConfig::LlmEngine(c) => Some(c),
            _ => None,
        })
    }

    pub fn output(&self) -> Option<&OutputConfig> {
        self.nodes.iter().find_map(|n| match &n.config {
            NodeConfig::Output(c) => Some(c),
            _ => None,
        })
    }

    /// Drop a new node with default config. Ids are `<type>-<n>`, with `n`
    /// one past the highest suffix already used for that type.
    pub fn add_node(&mut self, node_type: NodeType, position: Position) -> &WorkflowNode {
        let prefix = format!("{}-", node_type.as_str());
        let next = self
            .nodes
            .iter()
            .filter_map(|n| n.id.strip_prefix(&prefix)?.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;

        let index = self.nodes.len();
        self.nodes.push(WorkflowNode {
            id: format!("{}{}", prefix, next),
            position,
            label: node_type.label().to_string(),
            config: NodeConfig::defaults(node_type),
            is_configured: false,
        });
        &self.nodes[index]
    }

    /// Remove a node and every edge touching it. Returns whether it existed.
    pub fn remove_node(&mut self, node_id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != node_id);
        self.edges.retain(|e| !e.touches(node_id));
        self.nodes.len() != before
    }

    /// Replace a node's config. The config kind must match the node's kind.
    pub fn update_config(&mut self, node_id: &str, config: NodeConfig) -> anyhow::Result<()> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .ok_or_else(|| anyhow::anyhow!("no node {}", node_id))?;
        if node.node_type() != config.node_type() {
            anyhow::bail!(
                "cannot give {} node {} a {} config",
                node.node_type(),
                node_id,
                config.node_type()
            );
        }
        node.config = config;
        node.is_configured = true;
        Ok(())
    }

    pub fn connect(&mut self, source: &str, target: &str) {
        self.edges.push(WorkflowEdge::new(source, target));
    }

    /// Problems that keep the workflow from running, in display order.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.first(NodeType::UserQuery).is_none() {
            errors.push("Workflow must have a User Query component".to_string());
        }
        if self.first(NodeType::Output).is_none() {
            errors.push("Workflow must have an Output component".to_string());
        }
        if self.first(NodeType::LlmEngine).is_none() {
            errors.push("Workflow must have an LLM Engine component".to_string());
        }

        if self.nodes.len() > 1 {
            if self.edges.is_empty() {
                errors.push("Components must be connected".to_string());
            }
            for node in &self.nodes {
                if !self.edges.iter().any(|e| e.touches(&node.id)) {
                    errors.push(format!("{} is not connected", node.label));
                }
            }
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Build the chat request for a conversation run through this workflow.
    ///
    /// Only the LLM engine's `model` and `systemPrompt` and the knowledge
    /// base's `passContext` are consulted; documents are attached unless
    /// `passContext` is explicitly off.
    pub fn chat_request(&self, history: Vec<Message>, document_ids: Vec<String>) -> ChatRequest {
        let llm = self.llm_engine();
        let pass_context = self
            .knowledge_base()
            .map(KnowledgeBaseConfig::passes_context)
            .unwrap_or(true);

        ChatRequest {
            messages: history,
            system_prompt: llm.and_then(|c| c.system_prompt()).map(str::to_owned),
            model: llm.and_then(|c| c.model()).map(str::to_owned),
            document_ids: if pass_context { document_ids } else { Vec::new() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn connected_graph() -> WorkflowGraph {
        let mut graph = WorkflowGraph::default();
        for t in NodeType::ALL {
            graph.add_node(t, Position::default());
        }
        graph.connect("userQuery-1", "knowledgeBase-1");
        graph.connect("knowledgeBase-1", "llmEngine-1");
        graph.connect("llmEngine-1", "output-1");
        graph
    }

    #[test]
    fn test_decodes_canvas_shape() {
        let node: WorkflowNode = serde_json::from_value(json!({
            "id": "llmEngine-3",
            "type": "workflowNode",
            "position": {"x": 10.0, "y": 20.0},
            "data": {
                "label": "LLM Engine",
                "type": "llmEngine",
                "config": {"model": "gpt-4", "temperature": "0.2", "enableWebSearch": false},
                "isConfigured": true
            }
        }))
        .unwrap();

        assert_eq!(node.node_type(), NodeType::LlmEngine);
        let NodeConfig::LlmEngine(config) = &node.config else {
            panic!("wrong config kind");
        };
        assert_eq!(config.model(), Some("gpt-4"));
        assert_eq!(config.temperature(), 0.2);
        assert!(node.is_configured);
    }

    #[test]
    fn test_decodes_execute_shape() {
        let node: WorkflowNode = serde_json::from_value(json!({
            "id": "kb",
            "type": "knowledgeBase",
            "data": {"label": "KB", "config": {"name": "Docs", "topK": "", "passContext": "false"}}
        }))
        .unwrap();

        let NodeConfig::KnowledgeBase(config) = &node.config else {
            panic!("wrong config kind");
        };
        assert_eq!(config.name(), Some("Docs"));
        assert_eq!(config.top_k, None);
        assert!(!config.passes_context());
    }

    #[test]
    fn test_unknown_node_type_is_rejected() {
        let result = serde_json::from_value::<WorkflowNode>(json!({
            "id": "x", "type": "webhook", "data": {"label": "X", "config": {}}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_canvas_roundtrip_keeps_shape() {
        let graph = connected_graph();
        let value = serde_json::to_value(&graph).unwrap();

        assert_eq!(value["nodes"][0]["type"], "workflowNode");
        assert_eq!(value["nodes"][0]["data"]["type"], "userQuery");
        assert_eq!(value["nodes"][0]["data"]["config"]["maxLength"], 1000);
        assert_eq!(serde_json::from_value::<WorkflowGraph>(value).unwrap(), graph);
    }

    #[test]
    fn test_edge_extras_survive() {
        let edge: WorkflowEdge = serde_json::from_value(json!({
            "id": "e1", "source": "a", "target": "b", "animated": true
        }))
        .unwrap();
        assert_eq!(edge.extra.get("animated"), Some(&json!(true)));
        assert_eq!(serde_json::to_value(&edge).unwrap()["animated"], true);
    }

    #[test]
    fn test_add_node_ids_and_defaults() {
        let mut graph = WorkflowGraph::default();
        graph.add_node(NodeType::LlmEngine, Position::default());
        graph.add_node(NodeType::LlmEngine, Position::default());
        graph.remove_node("llmEngine-1");
        let node = graph.add_node(NodeType::LlmEngine, Position { x: 1.0, y: 2.0 });

        assert_eq!(node.id, "llmEngine-3");
        assert_eq!(node.label, "LLM Engine");
        assert!(!node.is_configured);
        assert_eq!(graph.llm_engine().and_then(|c| c.model()), Some("gpt-4"));
    }

    #[test]
    fn test_remove_node_drops_its_edges() {
        let mut graph = connected_graph();
        assert!(graph.remove_node("knowledgeBase-1"));
        assert_eq!(graph.edges.len(), 1);
        assert!(!graph.remove_node("knowledgeBase-1"));
    }

    #[test]
    fn test_update_config_checks_kind() {
        let mut graph = connected_graph();
        let err = graph.update_config("output-1", NodeConfig::defaults(NodeType::LlmEngine));
        assert!(err.is_err());

        graph
            .update_config(
                "output-1",
                NodeConfig::Output(OutputConfig {
                    format: Some("json".into()),
                    stream_response: Some(false),
                }),
            )
            .unwrap();
        assert_eq!(graph.output().and_then(|c| c.format.as_deref()), Some("json"));
        assert!(graph.first(NodeType::Output).unwrap().is_configured);
    }

    #[test]
    fn test_validate_empty_graph() {
        assert_eq!(
            WorkflowGraph::default().validate(),
            vec![
                "Workflow must have a User Query component",
                "Workflow must have an Output component",
                "Workflow must have an LLM Engine component",
            ]
        );
    }

    #[test]
    fn test_validate_unconnected_nodes() {
        let mut graph = WorkflowGraph::default();
        graph.add_node(NodeType::UserQuery, Position::default());
        graph.add_node(NodeType::LlmEngine, Position::default());
        graph.add_node(NodeType::Output, Position::default());

        assert_eq!(
            graph.validate(),
            vec![
                "Components must be connected",
                "User Query is not connected",
                "LLM Engine is not connected",
                "Output is not connected",
            ]
        );

        graph.connect("userQuery-1", "llmEngine-1");
        assert_eq!(graph.validate(), vec!["Output is not connected"]);
    }

    #[test]
    fn test_connected_graph_is_valid() {
        assert!(connected_graph().is_valid());
    }

    #[test]
    fn test_chat_request_reads_llm_and_kb_config() {
        let graph = connected_graph();
        let request = graph.chat_request(vec![Message::user("Hi")], vec!["d1".into()]);

        assert_eq!(request.model.as_deref(), Some("gpt-4"));
        assert!(request.system_prompt.unwrap().starts_with("You are a helpful assistant"));
        assert_eq!(request.document_ids, vec!["d1"]);
    }

    #[test]
    fn test_chat_request_respects_pass_context_off() {
        let mut graph = connected_graph();
        graph
            .update_config(
                "knowledgeBase-1",
                NodeConfig::KnowledgeBase(KnowledgeBaseConfig {
                    pass_context: Some(false),
                    ..Default::default()
                }),
            )
            .unwrap();

        let request = graph.chat_request(vec![Message::user("Hi")], vec!["d1".into()]);
        assert!(request.document_ids.is_empty());
    }

    #[test]
    fn test_chat_request_without_llm_node() {
        let request = WorkflowGraph::default().chat_request(vec![], vec!["d1".into()]);
        assert_eq!(request.model, None);
        assert_eq!(request.system_prompt, None);
        assert_eq!(request.document_ids, vec!["d1"]);
    }
}
