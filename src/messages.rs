//! Tool-call messages exchanged with the agent loop.
//!
//! An assistant message arrives in the OpenAI chat format, where each tool call
//! carries its arguments as a JSON-encoded string. [`AssistantMessage::tool_calls`]
//! decodes those into [`ToolCall`]s for dispatch, and dispatch answers each call
//! with a [`ToolMessage`] carrying the same id.

use crate::schemas::{AnswerQuestion, ReflexionPayload, ReviseAnswer};
use crate::tools::ReflexionTool;
use crate::types::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A structured tool-call request: tool name plus keyword arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
        }
    }

    /// Parse the arguments as the full schema named by the call.
    ///
    /// Unlike dispatch, which only reads `search_queries`, this requires every
    /// schema field to be present.
    pub fn payload(&self) -> AppResult<ReflexionPayload> {
        let tool: ReflexionTool = self.name.parse()?;
        let invalid = |e: serde_json::Error| AppError::InvalidArguments(format!("{}: {}", tool, e));
        let payload = match tool {
            ReflexionTool::AnswerQuestion => ReflexionPayload::Answer(
                serde_json::from_value::<AnswerQuestion>(self.args.clone()).map_err(invalid)?,
            ),
            ReflexionTool::ReviseAnswer => ReflexionPayload::Revision(
                serde_json::from_value::<ReviseAnswer>(self.args.clone()).map_err(invalid)?,
            ),
        };
        Ok(payload)
    }
}

/// Result of one tool call, addressed back to it by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolMessage {
    pub tool_call_id: String,
    pub name: String,
    /// JSON-encoded tool output
    pub content: String,
}

/// Function part of an OpenAI tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, as emitted by the model
    pub arguments: String,
}

/// Tool call in the OpenAI chat-completions wire format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiToolCall {
    pub id: String,
    #[serde(rename = "type", default = "default_call_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

fn default_call_type() -> String {
    "function".to_string()
}

impl TryFrom<OpenAiToolCall> for ToolCall {
    type Error = AppError;

    fn try_from(call: OpenAiToolCall) -> AppResult<Self> {
        let args = if call.function.arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(&call.function.arguments).map_err(|e| {
                AppError::InvalidArguments(format!(
                    "tool call {} ({}) has malformed arguments: {}",
                    call.id, call.function.name, e
                ))
            })?
        };

        Ok(ToolCall {
            id: call.id,
            name: call.function.name,
            args,
        })
    }
}

/// Assistant turn that may request tool calls
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<OpenAiToolCall>,
}

impl AssistantMessage {
    /// Decode every tool call; fails on the first malformed one
    pub fn tool_calls(&self) -> AppResult<Vec<ToolCall>> {
        self.tool_calls
            .iter()
            .cloned()
            .map(ToolCall::try_from)
            .collect()
    }
}
