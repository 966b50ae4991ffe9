//! Configuration type definitions for Switchboard
//!
//! All types implement serde traits and have sensible defaults, so a missing
//! or partial config file yields a working core.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SwitchboardError};

/// Main configuration struct for the orchestration core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Event bus configuration
    pub bus: BusConfig,
    /// Agent loop configuration
    pub agent: AgentConfig,
    /// Session store configuration
    pub session: SessionConfig,
}

/// Event bus configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Capacity of each bounded queue. A full queue suspends async
    /// producers and reports busy to non-blocking ones.
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

/// Agent loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum model rounds per inbound message before the loop forces a
    /// "limit reached" final answer
    pub max_iterations: usize,
    /// Hard deadline per tool call, in seconds
    pub tool_timeout_secs: u64,
    /// Optional overall deadline per inbound message, in seconds. Zero
    /// disables the watchdog.
    pub watchdog_secs: u64,
    /// Optional system prompt override
    pub system_prompt: Option<String>,
    /// Workspace directory handed to tool capabilities
    pub workspace: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tool_timeout_secs: 60,
            watchdog_secs: 0,
            system_prompt: None,
            workspace: None,
        }
    }
}

/// Session store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Override for the sessions directory (default: ~/.switchboard/sessions)
    pub dir: Option<String>,
    /// Idle threshold after which a session is evicted from the cache, in
    /// seconds
    pub idle_secs: u64,
    /// Interval between eviction sweeps, in seconds
    pub sweep_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dir: None,
            idle_secs: 3600,
            sweep_secs: 300,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// Configuration errors are fatal at startup, never silently ignored.
    ///
    /// # Errors
    /// Returns `SwitchboardError::Config` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.bus.capacity == 0 {
            return Err(SwitchboardError::Config(
                "bus.capacity must be non-zero".into(),
            ));
        }
        if self.agent.max_iterations == 0 {
            return Err(SwitchboardError::Config(
                "agent.max_iterations must be non-zero".into(),
            ));
        }
        if self.agent.tool_timeout_secs == 0 {
            return Err(SwitchboardError::Config(
                "agent.tool_timeout_secs must be non-zero".into(),
            ));
        }
        if self.session.sweep_secs == 0 {
            return Err(SwitchboardError::Config(
                "session.sweep_secs must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bus.capacity, 100);
        assert_eq!(config.agent.max_iterations, 10);
        assert_eq!(config.agent.tool_timeout_secs, 60);
        assert_eq!(config.session.idle_secs, 3600);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = Config::default();
        config.bus.capacity = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("bus.capacity"));
    }

    #[test]
    fn test_validate_rejects_zero_iterations() {
        let mut config = Config::default();
        config.agent.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.agent.tool_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [agent]
            max_iterations = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.agent.max_iterations, 3);
        assert_eq!(config.bus.capacity, 100);
        assert_eq!(config.session.sweep_secs, 300);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.agent.system_prompt = Some("Be terse.".into());
        config.session.dir = Some("/tmp/sessions".into());

        let encoded = toml::to_string(&config).unwrap();
        let decoded: Config = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded.agent.system_prompt.as_deref(), Some("Be terse."));
        assert_eq!(decoded.session.dir.as_deref(), Some("/tmp/sessions"));
    }
}
