//! Tools module - capability registry and invocation
//!
//! This module provides the infrastructure for registering and invoking the
//! external tool capabilities the model can call mid-loop.
//!
//! # Overview
//!
//! - `Tool` trait: the interface every capability implements
//! - `ToolContext`: execution context (connector, conversation, workspace)
//! - `ToolRegistry`: name → capability table, resolved once at startup
//! - `ToolInvoker`: deadline enforcement and outcome normalization
//!
//! Concrete production tools (shell, filesystem, web) live outside the core;
//! only `EchoTool` ships here, for wiring and tests.

mod invoker;
mod registry;
mod types;

pub use invoker::ToolInvoker;
pub use registry::ToolRegistry;
pub use types::{Tool, ToolContext};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// A simple echo tool for testing purposes.
///
/// Echoes back any message provided to it.
///
/// # Example
///
/// ```rust
/// use switchboard::tools::{Tool, ToolContext, EchoTool};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let tool = EchoTool;
/// let ctx = ToolContext::new();
/// let result = tool.execute(json!({"message": "Hello"}), &ctx).await;
/// assert_eq!(result.unwrap(), "Hello");
/// # });
/// ```
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes back the provided message"
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "The message to echo"
                }
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> Result<String> {
        let message = args
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("(no message)");
        Ok(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_echo_tool() {
        let tool = EchoTool;
        let ctx = ToolContext::new();

        let result = tool.execute(json!({"message": "Hello"}), &ctx).await;
        assert_eq!(result.unwrap(), "Hello");
    }

    #[tokio::test]
    async fn test_echo_tool_missing_message() {
        let tool = EchoTool;
        let ctx = ToolContext::new();

        let result = tool.execute(json!({}), &ctx).await;
        assert_eq!(result.unwrap(), "(no message)");
    }

    #[test]
    fn test_echo_tool_metadata() {
        let tool = EchoTool;
        assert_eq!(tool.name(), "echo");
        assert!(!tool.description().is_empty());
        assert!(tool.parameters().is_object());
    }
}
