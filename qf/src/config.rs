//! QuadFarm configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::coordinator::CoordinatorConfig;
use crate::domain::{Integrand, IntegrandSpec, Problem};
use crate::farm::Farm;

/// Main QuadFarm configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// What to integrate
    pub integration: IntegrationConfig,

    /// Worker pool and coordinator behavior
    pub farm: CoordinatorConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Runs the same pre-flight checks the farm runs, so a bad config fails
    /// before any worker is spawned.
    pub fn validate(&self) -> Result<()> {
        Farm::new(self.problem(), self.farm.clone())
            .preflight()
            .context("Invalid configuration")
    }

    /// Build the problem definition shared by all participants
    pub fn problem(&self) -> Problem {
        let integration = &self.integration;
        Problem::new(
            integration.a,
            integration.b,
            integration.epsilon,
            Integrand::from(&integration.integrand),
        )
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .quadfarm.yml
        let local_config = PathBuf::from(".quadfarm.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/quadfarm/quadfarm.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("quadfarm").join("quadfarm.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is set up
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|config| config.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Render the effective configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }
}

/// Integration bounds, tolerance and integrand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    /// Lower bound
    pub a: f64,

    /// Upper bound
    pub b: f64,

    /// Split while the one- and two-trapezoid estimates differ by more than this
    pub epsilon: f64,

    /// Function to integrate
    pub integrand: IntegrandSpec,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        debug!("IntegrationConfig::default: called");
        Self {
            a: 0.0,
            b: 5.0,
            epsilon: 1e-3,
            integrand: IntegrandSpec::default(),
        }
    }
}
