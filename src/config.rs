//! Engine configuration.
//!
//! Loaded from `sqlport.toml`. Every field has a default, so an empty file (or
//! no file at all) is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SqlportError, SqlportResult};
use crate::fix::DEFAULT_MIN_CONFIDENCE;
use crate::rules::FixCategory;

/// Config file name looked up in the working directory.
pub const CONFIG_FILE: &str = "sqlport.toml";

/// Default scan limit: 1 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 1024 * 1024;

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Confidence a fix must exceed to be applied automatically
    pub min_confidence: f64,

    /// Apply gate-passing fixes during generation
    pub auto_apply_safe: bool,

    /// Fix categories to run (empty = all)
    pub categories: Vec<FixCategory>,

    /// Largest schema or query text accepted, in bytes
    pub max_input_bytes: usize,

    pub advisor: AdvisorConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            auto_apply_safe: false,
            categories: Vec::new(),
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            advisor: AdvisorConfig::default(),
        }
    }
}

/// `[advisor]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub enabled: bool,
    pub model: String,
    pub timeout_secs: u64,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: "claude-sonnet-4-20250514".to_string(),
            timeout_secs: 30,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
        }
    }
}

impl AdvisorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl EngineConfig {
    /// Create a new configuration builder
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> SqlportResult<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| SqlportError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file.
    pub fn load(path: &Path) -> SqlportResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)
            .map_err(|e| SqlportError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Load from `explicit` if given, else the first existing candidate from
    /// [`EngineConfig::candidates`], else defaults.
    ///
    /// An explicit path that does not exist is an error; missing candidates
    /// are not.
    pub fn discover(explicit: Option<&Path>) -> SqlportResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        for candidate in Self::candidates() {
            if candidate.is_file() {
                return Self::load(&candidate);
            }
        }
        debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// `./sqlport.toml`, then `<config dir>/sqlport/config.toml`.
    pub fn candidates() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("sqlport").join("config.toml"));
        }
        paths
    }

    fn validate(&self) -> SqlportResult<()> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(SqlportError::Config(format!(
                "min_confidence must be within 0..=1, got {}",
                self.min_confidence
            )));
        }
        if self.max_input_bytes == 0 {
            return Err(SqlportError::Config("max_input_bytes must be positive".to_string()));
        }
        Ok(())
    }
}

/// Builder for EngineConfig
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn min_confidence(mut self, value: f64) -> Self {
        self.config.min_confidence = value;
        self
    }

    pub fn auto_apply_safe(mut self, enabled: bool) -> Self {
        self.config.auto_apply_safe = enabled;
        self
    }

    pub fn categories(mut self, categories: Vec<FixCategory>) -> Self {
        self.config.categories = categories;
        self
    }

    pub fn max_input_bytes(mut self, limit: usize) -> Self {
        self.config.max_input_bytes = limit;
        self
    }

    pub fn advisor(mut self, advisor: AdvisorConfig) -> Self {
        self.config.advisor = advisor;
        self
    }

    /// Build the configuration, rejecting out-of-range values.
    pub fn build(self) -> SqlportResult<EngineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
