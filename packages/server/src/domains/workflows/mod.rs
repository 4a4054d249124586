pub mod execute;
pub mod graph;
pub mod models;

pub use execute::{execute_workflow, ExecuteRequest, ExecutionOutput};
pub use graph::{NodeConfig, NodeType, Position, WorkflowEdge, WorkflowGraph, WorkflowNode};
pub use models::{Workflow, WorkflowInput};
