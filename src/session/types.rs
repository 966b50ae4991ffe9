//! Session types for Switchboard
//!
//! This module defines the durable conversation state: sessions, turns,
//! roles, and the tool call/result records embedded in turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A conversation session: the durable, ordered history for one conversation
/// id on one connector.
///
/// Sessions are identified by a key of the form `connector:conversation_id`
/// and carry a monotonically increasing revision counter, bumped by the store
/// on every successful exclusive mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for this session (e.g., "telegram:chat123")
    pub key: String,
    /// Ordered list of turns in this conversation
    pub turns: Vec<Turn>,
    /// Revision counter, incremented on each committed mutation
    pub revision: u64,
    /// When this session was created
    pub created_at: DateTime<Utc>,
    /// When this session last saw activity (drives cache eviction)
    pub last_active: DateTime<Utc>,
}

impl Session {
    /// Create a new empty session with the given key.
    ///
    /// # Example
    /// ```
    /// use switchboard::session::Session;
    ///
    /// let session = Session::new("telegram:chat123");
    /// assert!(session.turns.is_empty());
    /// assert_eq!(session.revision, 0);
    /// ```
    pub fn new(key: &str) -> Self {
        let now = Utc::now();
        Self {
            key: key.to_string(),
            turns: Vec::new(),
            revision: 0,
            created_at: now,
            last_active: now,
        }
    }

    /// Apply a turn to this session, idempotently.
    ///
    /// A turn whose id is already present is skipped and `false` is returned.
    /// Replaying a message after a crash between queue-consume and flush
    /// therefore cannot duplicate history.
    ///
    /// # Example
    /// ```
    /// use switchboard::session::{Session, Turn};
    ///
    /// let mut session = Session::new("test");
    /// let turn = Turn::user("Hello!");
    /// assert!(session.apply(turn.clone()));
    /// assert!(!session.apply(turn));
    /// assert_eq!(session.turns.len(), 1);
    /// ```
    pub fn apply(&mut self, turn: Turn) -> bool {
        if self.turns.iter().any(|t| t.id == turn.id) {
            return false;
        }
        self.turns.push(turn);
        self.last_active = Utc::now();
        true
    }

    /// Refresh the last-activity timestamp.
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// Get the number of turns in this session.
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// Check if this session is empty (no turns).
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Get the last turn in this session, if any.
    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Get turns by role.
    pub fn turns_by_role(&self, role: Role) -> Vec<&Turn> {
        self.turns.iter().filter(|t| t.role == role).collect()
    }
}

/// A single turn in a conversation.
///
/// A turn is one logical exchange unit: a message, or an assistant step with
/// the tool activity it triggered. Each turn carries a unique id so that
/// re-application is idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Unique identifier for this turn
    pub id: Uuid,
    /// The role of the turn's author
    pub role: Role,
    /// The text content of the turn
    pub content: String,
    /// Tool activity performed during this turn (assistant turns only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_records: Option<Vec<ToolRecord>>,
    /// When the turn was produced
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    fn with_role(role: Role, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.to_string(),
            tool_records: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user turn.
    pub fn user(content: &str) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant turn.
    pub fn assistant(content: &str) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system turn (prompts and instructions).
    pub fn system(content: &str) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create an assistant turn carrying completed tool activity.
    ///
    /// # Example
    /// ```
    /// use switchboard::session::{Turn, ToolCall, ToolRecord, ToolResult};
    /// use serde_json::json;
    ///
    /// let call = ToolCall::new("call_1", "echo", json!({"x": "y"}));
    /// let result = ToolResult::ok("call_1", "y");
    /// let turn = Turn::assistant_with_tools("Running echo.", vec![ToolRecord::new(call, result)]);
    /// assert!(turn.has_tool_records());
    /// ```
    pub fn assistant_with_tools(content: &str, records: Vec<ToolRecord>) -> Self {
        let mut turn = Self::with_role(Role::Assistant, content);
        turn.tool_records = Some(records);
        turn
    }

    /// Check if this turn carries tool activity.
    pub fn has_tool_records(&self) -> bool {
        self.tool_records
            .as_ref()
            .map(|r| !r.is_empty())
            .unwrap_or(false)
    }
}

/// The role of a turn's author.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompts and instructions
    System,
    /// Turns from the user
    User,
    /// Turns from the model
    Assistant,
    /// Turns carrying standalone tool output
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A single request to an external tool capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// Argument map for the tool
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Create a new tool call.
    ///
    /// # Example
    /// ```
    /// use switchboard::session::ToolCall;
    /// use serde_json::json;
    ///
    /// let call = ToolCall::new("call_123", "web_search", json!({"query": "rust"}));
    /// assert_eq!(call.name, "web_search");
    /// ```
    pub fn new(id: &str, name: &str, arguments: serde_json::Value) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }
    }

    /// Parse the arguments as a specific type.
    pub fn parse_arguments<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.arguments.clone())
    }
}

/// The outcome classification of a tool invocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    /// The capability completed and returned a payload
    Ok,
    /// The capability failed, or the tool name was unknown
    Error,
    /// The deadline elapsed and the capability was cancelled
    Timeout,
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolStatus::Ok => write!(f, "ok"),
            ToolStatus::Error => write!(f, "error"),
            ToolStatus::Timeout => write!(f, "timeout"),
        }
    }
}

/// The typed outcome of a single tool call. Every `ToolCall` yields exactly
/// one of these, whatever happens underneath.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Id of the call this result answers
    pub call_id: String,
    /// Outcome classification
    pub status: ToolStatus,
    /// Payload text on success, error detail otherwise
    pub content: String,
}

impl ToolResult {
    /// A successful result carrying the capability's payload.
    pub fn ok(call_id: &str, content: &str) -> Self {
        Self {
            call_id: call_id.to_string(),
            status: ToolStatus::Ok,
            content: content.to_string(),
        }
    }

    /// A failure result carrying the error detail.
    pub fn error(call_id: &str, detail: &str) -> Self {
        Self {
            call_id: call_id.to_string(),
            status: ToolStatus::Error,
            content: detail.to_string(),
        }
    }

    /// A timeout result for a cancelled capability.
    pub fn timeout(call_id: &str) -> Self {
        Self {
            call_id: call_id.to_string(),
            status: ToolStatus::Timeout,
            content: "tool call timed out".to_string(),
        }
    }

    /// Check whether the call succeeded.
    pub fn is_ok(&self) -> bool {
        self.status == ToolStatus::Ok
    }
}

/// A completed call/result pair recorded on an assistant turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRecord {
    /// The request the model issued
    pub call: ToolCall,
    /// The normalized outcome
    pub result: ToolResult,
}

impl ToolRecord {
    /// Pair a call with its result.
    pub fn new(call: ToolCall, result: ToolResult) -> Self {
        Self { call, result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_new() {
        let session = Session::new("test-session");
        assert_eq!(session.key, "test-session");
        assert!(session.turns.is_empty());
        assert_eq!(session.revision, 0);
        assert!(session.created_at <= session.last_active);
    }

    #[test]
    fn test_session_apply() {
        let mut session = Session::new("test");
        let before = session.last_active;

        std::thread::sleep(std::time::Duration::from_millis(5));

        assert!(session.apply(Turn::user("Hello")));
        assert_eq!(session.turns.len(), 1);
        assert!(session.last_active >= before);
    }

    #[test]
    fn test_session_apply_is_idempotent() {
        let mut session = Session::new("test");
        let turn = Turn::user("Hello");

        assert!(session.apply(turn.clone()));
        assert!(!session.apply(turn));
        assert_eq!(session.turn_count(), 1);
    }

    #[test]
    fn test_session_helpers() {
        let mut session = Session::new("test");
        assert!(session.is_empty());
        assert!(session.last_turn().is_none());

        session.apply(Turn::user("Hello"));
        session.apply(Turn::assistant("Hi!"));

        assert!(!session.is_empty());
        assert_eq!(session.turn_count(), 2);
        assert_eq!(session.last_turn().unwrap().role, Role::Assistant);
        assert_eq!(session.turns_by_role(Role::User).len(), 1);
    }

    #[test]
    fn test_turn_constructors() {
        let user = Turn::user("Hello");
        assert_eq!(user.role, Role::User);
        assert!(user.tool_records.is_none());

        let assistant = Turn::assistant("Hi there");
        assert_eq!(assistant.role, Role::Assistant);

        let system = Turn::system("You are helpful");
        assert_eq!(system.role, Role::System);
    }

    #[test]
    fn test_turn_ids_are_unique() {
        let a = Turn::user("same content");
        let b = Turn::user("same content");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_turn_with_tool_records() {
        let call = ToolCall::new("call_1", "search", json!({"q": "test"}));
        let result = ToolResult::ok("call_1", "Found it");
        let turn = Turn::assistant_with_tools("Searching...", vec![ToolRecord::new(call, result)]);

        assert!(turn.has_tool_records());
        let records = turn.tool_records.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].call.name, "search");
        assert!(records[0].result.is_ok());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::System.to_string(), "system");
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(Role::Tool.to_string(), "tool");
    }

    #[test]
    fn test_tool_call_parse_arguments() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct SearchArgs {
            query: String,
        }

        let call = ToolCall::new("call_1", "search", json!({"query": "rust"}));
        let args: SearchArgs = call.parse_arguments().unwrap();
        assert_eq!(args.query, "rust");
    }

    #[test]
    fn test_tool_result_constructors() {
        let ok = ToolResult::ok("c1", "payload");
        assert_eq!(ok.status, ToolStatus::Ok);
        assert!(ok.is_ok());

        let err = ToolResult::error("c1", "boom");
        assert_eq!(err.status, ToolStatus::Error);
        assert!(!err.is_ok());

        let timeout = ToolResult::timeout("c1");
        assert_eq!(timeout.status, ToolStatus::Timeout);
        assert_eq!(timeout.call_id, "c1");
    }

    #[test]
    fn test_tool_status_serde() {
        let json = serde_json::to_string(&ToolStatus::Timeout).unwrap();
        assert_eq!(json, r#""timeout""#);
        let back: ToolStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ToolStatus::Timeout);
    }

    #[test]
    fn test_session_serialization_round_trip() {
        let mut session = Session::new("test-session");
        session.apply(Turn::user("Hello"));
        let call = ToolCall::new("call_1", "echo", json!({"x": "y"}));
        let result = ToolResult::ok("call_1", "y");
        session.apply(Turn::assistant_with_tools(
            "Echoing.",
            vec![ToolRecord::new(call, result)],
        ));
        session.apply(Turn::assistant("Done."));
        session.revision = 3;

        let json = serde_json::to_string(&session).unwrap();
        let parsed: Session = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.key, "test-session");
        assert_eq!(parsed.revision, 3);
        assert_eq!(parsed.turns.len(), 3);
        assert_eq!(parsed.turns[0].id, session.turns[0].id);
        assert!(parsed.turns[1].has_tool_records());
    }

    #[test]
    fn test_turn_serialization_skips_empty_records() {
        let turn = Turn::user("Hello");
        let json = serde_json::to_string(&turn).unwrap();
        assert!(!json.contains("tool_records"));
    }
}
