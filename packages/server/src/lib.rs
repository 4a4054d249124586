// Workflow Builder - API Core
//
// Backend for the visual workflow builder: workflow and document persistence,
// the streaming chat relay, and one-shot workflow execution against the AI
// gateway.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
