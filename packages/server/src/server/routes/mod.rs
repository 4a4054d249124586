// HTTP routes
pub mod chat;
pub mod documents;
pub mod execute;
pub mod health;
pub mod workflows;

pub use chat::*;
pub use documents::*;
pub use execute::*;
pub use health::*;
pub use workflows::*;
