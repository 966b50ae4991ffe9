//! Configuration management for Switchboard
//!
//! Configuration is loaded from `~/.switchboard/config.toml` with
//! environment variable overrides using the pattern
//! `SWITCHBOARD_SECTION_KEY` (e.g., `SWITCHBOARD_AGENT_MAX_ITERATIONS`).

mod types;

pub use types::{AgentConfig, BusConfig, Config, SessionConfig};

use crate::error::{Result, SwitchboardError};
use std::path::{Path, PathBuf};

impl Config {
    /// Returns the Switchboard configuration directory path (~/.switchboard)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".switchboard")
    }

    /// Returns the path to the config file (~/.switchboard/config.toml)
    pub fn path() -> PathBuf {
        Self::dir().join("config.toml")
    }

    /// Load configuration from the default path with environment overrides.
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load configuration from a specific path with environment overrides.
    ///
    /// # Errors
    /// Returns `SwitchboardError::Config` for unreadable or malformed files
    /// and for values that fail validation.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)
                .map_err(|e| SwitchboardError::Config(format!("parse {}: {}", path.display(), e)))?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| SwitchboardError::Config(format!("encode config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SWITCHBOARD_BUS_CAPACITY") {
            if let Ok(v) = val.parse() {
                self.bus.capacity = v;
            }
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_AGENT_MAX_ITERATIONS") {
            if let Ok(v) = val.parse() {
                self.agent.max_iterations = v;
            }
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_AGENT_TOOL_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                self.agent.tool_timeout_secs = v;
            }
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_AGENT_WORKSPACE") {
            self.agent.workspace = Some(val);
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_SESSION_DIR") {
            self.session.dir = Some(val);
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_SESSION_IDLE_SECS") {
            if let Ok(v) = val.parse() {
                self.session.idle_secs = v;
            }
        }
    }
}
