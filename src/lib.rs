// Reflexion Tools - web search dispatch for reflect-and-revise agents

pub mod config;
pub mod types;
pub mod schemas;
pub mod search;    // Search providers (Tavily)
pub mod tools;     // Tool dispatch node
pub mod messages;

// Re-exports for convenience
pub use config::Config;
pub use messages::{ToolCall, ToolMessage};
pub use schemas::{AnswerQuestion, Reflection, ReflexionPayload, ReviseAnswer};
pub use tools::{run_queries, ReflexionTool, ToolNode};
pub use types::{AppError, AppResult};
