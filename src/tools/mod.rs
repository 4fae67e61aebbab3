//! Tool System
//!
//! Both reflect-and-revise schemas are exposed to the model as tools. Whichever one
//! the model calls, the same handler runs: [`run_queries`] takes the call's
//! `search_queries` and fans them out to the search provider.
//!
//! ```text
//! ToolCall { name: "AnswerQuestion" | "ReviseAnswer", args }
//!      │
//!      ▼
//! ┌─────────────┐
//! │  ToolNode   │  → resolves name to ReflexionTool
//! └─────────────┘
//!      │
//!      ▼
//! ┌─────────────┐
//! │ run_queries │  → provider.batch (concurrent, order kept)
//! └─────────────┘
//!      │
//!      ▼
//! ToolMessage { tool_call_id, content: [[results for q1], [results for q2], ...] }
//! ```

pub mod node;

pub use node::ToolNode;

use crate::schemas::{
    ANSWER_DESC, MISSING_DESC, REFERENCES_DESC, REFLECTION_DESC, SEARCH_QUERIES_DESC,
    SUPERFLUOUS_DESC,
};
use crate::search::{SearchError, SearchProvider, SearchRequest, SearchResult};
use crate::types::AppError;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Tools the model may call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReflexionTool {
    AnswerQuestion,
    ReviseAnswer,
}

impl ReflexionTool {
    pub const ALL: [ReflexionTool; 2] = [ReflexionTool::AnswerQuestion, ReflexionTool::ReviseAnswer];

    /// Name used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            ReflexionTool::AnswerQuestion => "AnswerQuestion",
            ReflexionTool::ReviseAnswer => "ReviseAnswer",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ReflexionTool::AnswerQuestion => "Answer the question.",
            ReflexionTool::ReviseAnswer => "Revise your original answer to your question.",
        }
    }

    /// OpenAI-style function definition describing the schema to the model
    pub fn definition(&self) -> Value {
        let mut properties = json!({
            "answer": {
                "type": "string",
                "description": ANSWER_DESC
            },
            "reflection": {
                "type": "object",
                "description": REFLECTION_DESC,
                "properties": {
                    "missing": {"type": "string", "description": MISSING_DESC},
                    "superfluous": {"type": "string", "description": SUPERFLUOUS_DESC}
                },
                "required": ["missing", "superfluous"]
            },
            "search_queries": {
                "type": "array",
                "items": {"type": "string"},
                "description": SEARCH_QUERIES_DESC
            }
        });
        let mut required = vec!["answer", "reflection", "search_queries"];

        if *self == ReflexionTool::ReviseAnswer {
            properties["references"] = json!({
                "type": "array",
                "items": {"type": "string"},
                "description": REFERENCES_DESC
            });
            required.push("references");
        }

        json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required
                }
            }
        })
    }
}

impl fmt::Display for ReflexionTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReflexionTool {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReflexionTool::ALL
            .into_iter()
            .find(|tool| tool.name() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = ReflexionTool::ALL.iter().map(|t| t.name()).collect();
                AppError::UnknownTool(format!("{} is not a valid tool, try one of [{}]", s, valid.join(", ")))
            })
    }
}

/// Run the generated queries.
///
/// Returns one result batch per query, in query order. Provider errors are passed
/// through untouched.
pub async fn run_queries(
    provider: &dyn SearchProvider,
    search_queries: &[String],
) -> Result<Vec<Vec<SearchResult>>, SearchError> {
    if search_queries.is_empty() {
        return Ok(Vec::new());
    }

    let requests: Vec<SearchRequest> = search_queries
        .iter()
        .map(|query| SearchRequest::new(query.as_str()))
        .collect();

    debug!(count = requests.len(), "Running search queries");
    provider.batch(&requests).await
}
