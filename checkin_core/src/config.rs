//! Configuration file support for the check-in tools.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/checkin/config.toml`.
//! The check-in window and sufficiency thresholds are constants in
//! [`crate::window`] and are deliberately absent here.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub recommender: RecommenderConfig,

    #[serde(default)]
    pub trend: TrendConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// External macro recommender and its call policy
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Program that reads a JSON request on stdin and answers on stdout
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_retry_jitter_ms")]
    pub retry_jitter_ms: u64,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_jitter_ms: default_retry_jitter_ms(),
        }
    }
}

impl RecommenderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Parameters of the bundled EMA trend smoother
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrendConfig {
    #[serde(default = "default_trend_alpha")]
    pub alpha: f64,

    #[serde(default = "default_trend_min_history")]
    pub min_history: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            alpha: default_trend_alpha(),
            min_history: default_trend_min_history(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("checkin")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_retry_jitter_ms() -> u64 {
    250
}

fn default_trend_alpha() -> f64 {
    0.1
}

fn default_trend_min_history() -> usize {
    7
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("checkin").join("config.toml")
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.recommender.timeout_secs == 0 {
            return Err(Error::Config("recommender.timeout_secs must be > 0".into()));
        }
        if self.recommender.max_retries > 1 {
            return Err(Error::Config(format!(
                "recommender.max_retries is capped at 1, got {}",
                self.recommender.max_retries
            )));
        }
        if !(self.trend.alpha > 0.0 && self.trend.alpha <= 1.0) {
            return Err(Error::Config(format!(
                "trend.alpha must be in (0, 1], got {}",
                self.trend.alpha
            )));
        }
        Ok(())
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
