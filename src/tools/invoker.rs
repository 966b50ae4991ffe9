//! Tool invoker: deadline enforcement and outcome normalization
//!
//! The invoker sits between the agent loop and the tool registry. Every
//! invocation, whatever happens underneath — success, capability failure,
//! unknown name, deadline, panic — comes back as exactly one
//! [`ToolResult`]. Nothing here returns `Err`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::session::{ToolCall, ToolResult};

use super::{ToolContext, ToolRegistry};

/// Invokes tool capabilities with a hard per-call deadline.
///
/// The capability runs in its own task. If the deadline elapses first, the
/// task is aborted — the capability is signaled to stop and its result, if
/// any, discarded — and a `timeout` result is returned. Cancellation happens
/// before any turn is appended for the call, so a cancelled call can never
/// corrupt a session's turn sequence.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use serde_json::json;
/// use switchboard::session::ToolCall;
/// use switchboard::tools::{EchoTool, ToolContext, ToolInvoker, ToolRegistry};
///
/// # tokio_test::block_on(async {
/// let mut registry = ToolRegistry::new();
/// registry.register(Box::new(EchoTool)).unwrap();
/// let invoker = ToolInvoker::new(Arc::new(registry));
///
/// let call = ToolCall::new("call_1", "echo", json!({"message": "hi"}));
/// let result = invoker
///     .invoke(&call, &ToolContext::new(), Duration::from_secs(5))
///     .await;
/// assert!(result.is_ok());
/// assert_eq!(result.content, "hi");
/// # });
/// ```
pub struct ToolInvoker {
    registry: Arc<ToolRegistry>,
}

impl ToolInvoker {
    /// Create an invoker over a registry resolved at startup.
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this invoker resolves against.
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Invoke the named tool with a hard deadline.
    ///
    /// Outcomes:
    /// - unknown tool name → `error` result, never a panic or `Err`
    /// - capability returns text → `ok` result with the payload
    /// - capability fails → `error` result with the failure detail
    /// - capability panics → `error` result (the panic is contained by the
    ///   spawned task)
    /// - deadline elapses → the task is aborted, `timeout` result
    pub async fn invoke(
        &self,
        call: &ToolCall,
        ctx: &ToolContext,
        timeout: Duration,
    ) -> ToolResult {
        let Some(tool) = self.registry.get(&call.name) else {
            warn!(tool = %call.name, id = %call.id, "Unknown tool requested");
            return ToolResult::error(&call.id, &format!("unknown tool: {}", call.name));
        };

        let args = call.arguments.clone();
        let ctx = ctx.clone();
        let start = Instant::now();

        // Run the capability in its own task so a deadline can abort it and
        // a panic stays contained.
        let handle = tokio::spawn(async move { tool.execute(args, &ctx).await });
        let abort = handle.abort_handle();

        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(Ok(payload))) => {
                debug!(
                    tool = %call.name,
                    id = %call.id,
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Tool executed successfully"
                );
                ToolResult::ok(&call.id, &payload)
            }
            Ok(Ok(Err(e))) => {
                error!(
                    tool = %call.name,
                    id = %call.id,
                    latency_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "Tool execution failed"
                );
                ToolResult::error(&call.id, &e.to_string())
            }
            Ok(Err(join_err)) => {
                error!(
                    tool = %call.name,
                    id = %call.id,
                    error = %join_err,
                    "Tool task aborted abnormally"
                );
                ToolResult::error(&call.id, &format!("tool task failed: {}", join_err))
            }
            Err(_elapsed) => {
                abort.abort();
                warn!(
                    tool = %call.name,
                    id = %call.id,
                    timeout_ms = timeout.as_millis() as u64,
                    "Tool call exceeded deadline, cancelled"
                );
                ToolResult::timeout(&call.id)
            }
        }
    }
}
