//! Tool types for Switchboard
//!
//! This module defines the `Tool` trait implemented by external capabilities
//! and the `ToolContext` struct that carries execution context into them.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Trait implemented by every external tool capability.
///
/// Tools are async functions the model can call mid-loop. They return text
/// or fail; the invoker normalizes both (plus timeouts and panics) into a
/// [`ToolResult`](crate::session::ToolResult), so nothing a tool does can
/// propagate control-flow errors into the agent loop.
///
/// Capabilities run on the shared cooperative scheduler. An implementation
/// that performs blocking I/O must isolate it (`tokio::task::spawn_blocking`)
/// so it cannot stall event processing for unrelated sessions.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use switchboard::tools::{Tool, ToolContext};
/// use switchboard::error::Result;
///
/// struct MyTool;
///
/// #[async_trait]
/// impl Tool for MyTool {
///     fn name(&self) -> &str { "my_tool" }
///     fn description(&self) -> &str { "Does something useful" }
///     fn parameters(&self) -> Value {
///         serde_json::json!({
///             "type": "object",
///             "properties": {},
///             "required": []
///         })
///     }
///     async fn execute(&self, _args: Value, _ctx: &ToolContext) -> Result<String> {
///         Ok("Done!".to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool name the model uses to request it. Unique within a registry.
    fn name(&self) -> &str;

    /// Description sent to the model so it knows when to use the tool.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's argument map.
    fn parameters(&self) -> Value;

    /// Execute the tool with the given arguments.
    ///
    /// # Arguments
    /// * `args` - The JSON argument map from the model
    /// * `ctx` - The execution context (connector, conversation, workspace)
    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<String>;
}

/// Context provided to tools during execution.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// The connector the triggering message arrived on
    pub connector: Option<String>,
    /// The conversation ID within the connector
    pub conversation_id: Option<String>,
    /// The workspace directory for file operations
    pub workspace: Option<String>,
}

impl ToolContext {
    /// Create a new empty tool context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connector and conversation ID.
    ///
    /// # Example
    /// ```
    /// use switchboard::tools::ToolContext;
    ///
    /// let ctx = ToolContext::new().with_conversation("telegram", "123456");
    /// assert_eq!(ctx.connector.as_deref(), Some("telegram"));
    /// ```
    pub fn with_conversation(mut self, connector: &str, conversation_id: &str) -> Self {
        self.connector = Some(connector.to_string());
        self.conversation_id = Some(conversation_id.to_string());
        self
    }

    /// Set the workspace directory.
    pub fn with_workspace(mut self, workspace: &str) -> Self {
        self.workspace = Some(workspace.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_context_new() {
        let ctx = ToolContext::new();
        assert!(ctx.connector.is_none());
        assert!(ctx.conversation_id.is_none());
        assert!(ctx.workspace.is_none());
    }

    #[test]
    fn test_tool_context_builder_chain() {
        let ctx = ToolContext::new()
            .with_conversation("discord", "abc123")
            .with_workspace("/tmp/workspace");

        assert_eq!(ctx.connector.as_deref(), Some("discord"));
        assert_eq!(ctx.conversation_id.as_deref(), Some("abc123"));
        assert_eq!(ctx.workspace.as_deref(), Some("/tmp/workspace"));
    }

    #[test]
    fn test_tool_context_clone() {
        let ctx1 = ToolContext::new().with_conversation("telegram", "123");
        let ctx2 = ctx1.clone();
        assert_eq!(ctx1.connector, ctx2.connector);
        assert_eq!(ctx1.conversation_id, ctx2.conversation_id);
    }
}
