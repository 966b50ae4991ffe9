//! Switchboard - conversational orchestration core
//!
//! A single-process core that routes inbound conversational events through a
//! tool-augmented model loop and returns outbound events, guaranteeing that
//! state tied to one conversation is never corrupted by concurrent access.
//!
//! The crate covers three tightly coupled pieces:
//!
//! - [`bus::EventBus`] — bounded, ordered inbound/outbound queues plus
//!   connector-keyed outbound fan-out
//! - [`agent::AgentLoop`] — the bounded think/act iteration turning one
//!   inbound message into tool invocations and exactly one reply
//! - [`session::SessionStore`] — exclusive, serialized access to each
//!   conversation's durable history
//!
//! Model backends, tool capabilities and chat connectors are external
//! collaborators, plugged in through the [`providers::ModelProvider`] and
//! [`tools::Tool`] traits and the bus's publish/subscribe surface.

pub mod agent;
pub mod bus;
pub mod config;
pub mod error;
pub mod logging;
pub mod providers;
pub mod session;
pub mod tools;

pub use agent::{AgentLoop, ContextBuilder};
pub use bus::{EventBus, InboundMessage, MediaKind, MediaRef, OutboundMessage};
pub use config::Config;
pub use error::{Result, SwitchboardError};
pub use providers::{ModelProvider, ModelResponse, ToolDefinition};
pub use session::{Session, SessionStore, ToolCall, ToolRecord, ToolResult, ToolStatus, Turn};
pub use tools::{EchoTool, Tool, ToolContext, ToolInvoker, ToolRegistry};
