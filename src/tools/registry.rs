//! Tool registry for Switchboard
//!
//! The registry maps tool names to capabilities. It is populated once during
//! startup wiring and read-only afterwards; dynamic dispatch happens by name
//! lookup, never by reflection.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::error::{Result, SwitchboardError};
use crate::providers::ToolDefinition;

use super::Tool;

/// A registry that holds the tool capabilities available to the agent loop.
///
/// Duplicate names are a configuration error at registration time, not a
/// runtime one: `register` refuses the second capability instead of silently
/// shadowing the first.
///
/// # Example
///
/// ```rust
/// use switchboard::tools::{ToolRegistry, EchoTool};
///
/// let mut registry = ToolRegistry::new();
/// registry.register(Box::new(EchoTool)).unwrap();
/// assert!(registry.has("echo"));
/// assert!(registry.register(Box::new(EchoTool)).is_err());
/// ```
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a new tool in the registry.
    ///
    /// # Errors
    /// Returns `SwitchboardError::Config` if a tool with the same name is
    /// already registered.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(SwitchboardError::Config(format!(
                "duplicate tool name: {}",
                name
            )));
        }
        info!(tool = %name, "Registering tool");
        self.tools.insert(name, Arc::from(tool));
        Ok(())
    }

    /// Resolve a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Get all tool definitions for the model backend.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters(),
            })
            .collect()
    }

    /// Names of all registered tools.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Check if a tool exists in the registry.
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
