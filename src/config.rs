//! Configuration loading and defaults for the idler.

use crate::error::{IdleError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "MOUSE_IDLER_CONFIG";

/// Main configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct IdlerConfig {
    /// Seconds of user inactivity before the idler moves again (default: 3).
    pub cooldown_secs: u64,

    /// Shortest move, in pixels (default: 75).
    pub min_radius: f64,

    /// Longest move, in pixels (default: 300).
    pub max_radius: f64,

    /// Pixels per step (default: 1).
    pub step_length: f64,

    /// Delay between steps in milliseconds (default: 10).
    pub step_interval_ms: u64,

    /// Back-off after an interrupted move, and prompt polling period (default: 100).
    pub poll_interval_ms: u64,

    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for IdlerConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 3,
            min_radius: 75.0,
            max_radius: 300.0,
            step_length: 1.0,
            step_interval_ms: 10,
            poll_interval_ms: 100,
            log_filter: "mouse_idler=info".to_string(),
        }
    }
}

impl IdlerConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            IdleError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: IdlerConfig = toml::from_str(&content).map_err(|e| {
            IdleError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, else `$MOUSE_IDLER_CONFIG`, else the default location,
    /// falling back to defaults when no file exists.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(p) = path {
            return Self::load(p);
        }
        if let Some(p) = std::env::var_os(CONFIG_ENV) {
            return Self::load(Path::new(&p));
        }
        if let Some(default_path) = Self::default_path() {
            if default_path.exists() {
                return Self::load(&default_path);
            }
        }
        Ok(Self::default())
    }

    /// `<config dir>/mouse-idler/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mouse-idler").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_radius >= 0.0) {
            return Err(IdleError::Config("min_radius must be non-negative".into()));
        }
        if !(self.max_radius >= self.min_radius) || !self.max_radius.is_finite() {
            return Err(IdleError::Config(
                "max_radius must be finite and at least min_radius".into(),
            ));
        }
        if !(self.step_length > 0.0) {
            return Err(IdleError::Config("step_length must be positive".into()));
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
