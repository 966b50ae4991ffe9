//! Context builder for agent conversations
//!
//! Assembles the model-facing message list for each round: the system
//! prompt, any externally supplied context material, and the session's
//! persisted turns. The builder has no opinion about what the context
//! material contains; prompt authoring is a collaborator concern.

use crate::session::{Role, Turn};

/// Default system prompt for the orchestration core.
const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful assistant.

You have access to tools. Use them when needed to complete the user's
request, then answer concisely."#;

/// Builder for the ordered message list sent to the model backend.
///
/// # Example
///
/// ```rust
/// use switchboard::agent::ContextBuilder;
/// use switchboard::session::Turn;
///
/// let builder = ContextBuilder::new().with_system_prompt("Be terse.");
/// let messages = builder.build_messages(&[Turn::user("Hello!")]);
/// assert_eq!(messages.len(), 2); // system + user
/// ```
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    /// The system prompt to prepend
    system_prompt: String,
    /// Optional extra context appended to the system prompt
    extra_context: Option<String>,
}

impl ContextBuilder {
    /// Create a builder with the default system prompt.
    pub fn new() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            extra_context: None,
        }
    }

    /// Replace the system prompt (builder pattern).
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// Append externally supplied context material to the system prompt
    /// (builder pattern). The material is treated as opaque.
    pub fn with_extra_context(mut self, context: &str) -> Self {
        self.extra_context = Some(context.to_string());
        self
    }

    /// Render the system turn.
    pub fn build_system_turn(&self) -> Turn {
        let content = match &self.extra_context {
            Some(extra) => format!("{}\n\n{}", self.system_prompt, extra),
            None => self.system_prompt.clone(),
        };
        Turn::system(&content)
    }

    /// Build the full model-facing message list from persisted turns.
    ///
    /// The system turn is prepended; any system turns already present in
    /// the history are skipped so the prompt appears exactly once.
    pub fn build_messages(&self, turns: &[Turn]) -> Vec<Turn> {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(self.build_system_turn());
        messages.extend(turns.iter().filter(|t| t.role != Role::System).cloned());
        messages
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
