//! Agent module - the message-processing control loop
//!
//! This module provides the core control loop of Switchboard. The agent is
//! responsible for:
//!
//! - Pulling inbound messages off the event bus
//! - Acquiring the owning session's exclusive section
//! - Building conversation context from persisted turns
//! - Driving the bounded think/act iteration against the model backend
//! - Invoking tools through the deadline-enforcing invoker
//! - Persisting history and emitting exactly one reply per message
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────┐
//! │  EventBus   │────>│  AgentLoop  │────>│ModelProvider │
//! │  (inbound)  │     │             │     │  (backend)   │
//! └─────────────┘     └─────────────┘     └──────────────┘
//!                            │                   │
//!                            ▼                   ▼
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │   Session   │     │    Tool     │
//!                     │    Store    │     │   Invoker   │
//!                     └─────────────┘     └─────────────┘
//! ```

mod context;
mod r#loop;

pub use context::ContextBuilder;
pub use r#loop::AgentLoop;
