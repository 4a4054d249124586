pub mod workflow;

pub use workflow::{Workflow, WorkflowInput};
