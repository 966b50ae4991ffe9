//! Logging initialization for Switchboard.
//!
//! The core emits structured `tracing` events everywhere; embedding
//! applications call [`init_logging`] once at startup to install a
//! subscriber. The filter falls back to the `RUST_LOG` env var; if unset,
//! the provided default level is used.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Call this once at startup before any tracing events are emitted.
/// Panics if a global subscriber is already installed; use
/// [`try_init_logging`] where that is not acceptable (tests, embedders).
pub fn init_logging(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(default_level))
        .with_target(true)
        .compact()
        .init();
}

/// Like [`init_logging`] but returns `false` instead of panicking when a
/// subscriber is already installed.
pub fn try_init_logging(default_level: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter(default_level))
        .with_target(true)
        .compact()
        .try_init()
        .is_ok()
}

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_init_is_idempotent() {
        // First call may or may not win the race with other tests; the
        // second call must report the subscriber as already installed.
        let _ = try_init_logging("info");
        assert!(!try_init_logging("debug"));
    }
}
