//! Provider types for Switchboard
//!
//! This module defines the seam to the language-model backend. The backend
//! is an external collaborator: it accepts an ordered message history plus a
//! tool schema and returns either a final answer or a list of tool calls.
//! Concrete HTTP providers live outside the core; tests use scripted
//! implementations of [`ModelProvider`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::{ToolCall, Turn};

/// Definition of a tool advertised to the model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The name of the tool (unique within a registry)
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON Schema describing the tool's argument map
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition.
    ///
    /// # Example
    /// ```
    /// use switchboard::providers::ToolDefinition;
    /// use serde_json::json;
    ///
    /// let tool = ToolDefinition::new(
    ///     "web_search",
    ///     "Search the web for information",
    ///     json!({
    ///         "type": "object",
    ///         "properties": {
    ///             "query": { "type": "string", "description": "Search query" }
    ///         },
    ///         "required": ["query"]
    ///     }),
    /// );
    /// assert_eq!(tool.name, "web_search");
    /// ```
    pub fn new(name: &str, description: &str, parameters: serde_json::Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }
}

/// Trait for model backends.
///
/// Implementations translate between Switchboard's turn format and the
/// backend's wire format. Backend failures surface as
/// `SwitchboardError::Provider` — a distinct error kind from tool failures,
/// because the agent loop aborts the pass on a backend failure but feeds a
/// tool failure back into the conversation.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Send one model round: the ordered conversation plus the available
    /// tool schema.
    ///
    /// # Returns
    /// A [`ModelResponse`] that either carries tool calls (the loop runs a
    /// tool round) or is final (the loop emits the content as the reply).
    async fn chat(&self, messages: Vec<Turn>, tools: Vec<ToolDefinition>)
        -> Result<ModelResponse>;

    /// The provider name (e.g., "anthropic", "openai").
    fn name(&self) -> &str;
}

/// Response from one model round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Text content of the response
    pub content: String,
    /// Tool calls requested by the model (empty means the answer is final)
    pub tool_calls: Vec<ToolCall>,
}

impl ModelResponse {
    /// A final text answer with no tool calls.
    ///
    /// # Example
    /// ```
    /// use switchboard::providers::ModelResponse;
    ///
    /// let response = ModelResponse::text("Hello, world!");
    /// assert!(!response.has_tool_calls());
    /// ```
    pub fn text(content: &str) -> Self {
        Self {
            content: content.to_string(),
            tool_calls: vec![],
        }
    }

    /// A response requesting tool calls.
    ///
    /// # Example
    /// ```
    /// use switchboard::providers::ModelResponse;
    /// use switchboard::session::ToolCall;
    /// use serde_json::json;
    ///
    /// let call = ToolCall::new("call_1", "search", json!({"query": "rust"}));
    /// let response = ModelResponse::with_tools("Searching...", vec![call]);
    /// assert!(response.has_tool_calls());
    /// ```
    pub fn with_tools(content: &str, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.to_string(),
            tool_calls,
        }
    }

    /// Whether this response requests tool calls.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
