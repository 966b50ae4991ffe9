//! Error types for Switchboard
//!
//! This module defines all error types used throughout the orchestration core.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.
//!
//! The variants follow the failure taxonomy of the core: configuration errors
//! are fatal at startup or the offending call site, transient backend/tool
//! failures are converted to typed results before they cross a component
//! boundary, capacity errors surface backpressure to producers, and
//! persistence failures stay distinguishable from session logic failures so
//! callers can retry a flush without repeating model or tool work.

use thiserror::Error;

/// The primary error type for Switchboard operations.
#[derive(Error, Debug)]
pub enum SwitchboardError {
    /// Configuration-related errors (invalid config, duplicate tool names,
    /// malformed session keys, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model backend errors (API failures, malformed replies, etc.).
    /// Distinct from tool errors: a backend failure aborts the current pass.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Tool execution errors that escape the invoker's normalization layer.
    /// Almost everything tool-related is reported as a `ToolResult` instead.
    #[error("Tool error: {0}")]
    Tool(String),

    /// Session management errors (invalid state, unknown keys, etc.)
    #[error("Session error: {0}")]
    Session(String),

    /// Durable-write failures from the session store. Kept separate from
    /// `Session` so callers can retry the flush without redoing the turn.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A bounded bus queue is at capacity; the producer should back off.
    #[error("Bus busy: {0}")]
    Busy(String),

    /// Bus channel closed unexpectedly (all consumers dropped).
    #[error("Bus error: channel closed")]
    BusClosed,

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SwitchboardError {
    /// Returns `true` for failures a producer may retry after backing off.
    pub fn is_backpressure(&self) -> bool {
        matches!(self, SwitchboardError::Busy(_))
    }

    /// Returns `true` if this is a durable-write failure, as opposed to a
    /// logic failure inside an exclusive session section.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            SwitchboardError::Persistence(_) | SwitchboardError::Io(_)
        )
    }
}

/// A specialized `Result` type for Switchboard operations.
pub type Result<T> = std::result::Result<T, SwitchboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SwitchboardError::Config("bus capacity must be non-zero".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: bus capacity must be non-zero"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SwitchboardError = io_err.into();
        assert!(matches!(err, SwitchboardError::Io(_)));
        assert!(err.is_persistence());
    }

    #[test]
    fn test_persistence_is_distinct_from_session() {
        let persistence = SwitchboardError::Persistence("rename failed".into());
        let logic = SwitchboardError::Session("bad state".into());
        assert!(persistence.is_persistence());
        assert!(!logic.is_persistence());
    }

    #[test]
    fn test_busy_is_backpressure() {
        assert!(SwitchboardError::Busy("inbound queue full".into()).is_backpressure());
        assert!(!SwitchboardError::BusClosed.is_backpressure());
    }

    #[test]
    fn test_result_type() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }

    #[test]
    fn test_error_variants() {
        let _ = SwitchboardError::Config("test".into());
        let _ = SwitchboardError::Provider("test".into());
        let _ = SwitchboardError::Tool("test".into());
        let _ = SwitchboardError::Session("test".into());
        let _ = SwitchboardError::Persistence("test".into());
        let _ = SwitchboardError::Busy("test".into());
        let _ = SwitchboardError::BusClosed;
    }
}
