//! Configuration for Guia.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::position::AccuracyQuality;
use crate::{GuiaError, GuiaResult};

/// Main configuration for Guia.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Position admission filter settings.
    #[serde(default)]
    pub position: PositionConfig,

    /// Address cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Position admission filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionConfig {
    /// Minimum distance (meters) from the tracked position to accept a sample.
    #[serde(default = "default_min_distance")]
    pub min_distance_meters: f64,

    /// Minimum elapsed time (milliseconds) to accept a sample regardless of distance.
    #[serde(default = "default_min_time")]
    pub min_time_ms: u64,

    /// Accepted samples arriving sooner than this (milliseconds) are classified as immediate.
    #[serde(default = "default_immediate_threshold")]
    pub immediate_threshold_ms: u64,

    /// Accuracy qualities that are always rejected.
    #[serde(default = "default_rejected_qualities")]
    pub rejected_qualities: Vec<AccuracyQuality>,
}

impl PositionConfig {
    /// Minimum elapsed time as a `Duration`.
    pub fn min_time(&self) -> Duration {
        Duration::from_millis(self.min_time_ms)
    }

    /// Immediate threshold as a `Duration`.
    pub fn immediate_threshold(&self) -> Duration {
        Duration::from_millis(self.immediate_threshold_ms)
    }
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            min_distance_meters: default_min_distance(),
            min_time_ms: default_min_time(),
            immediate_threshold_ms: default_immediate_threshold(),
            rejected_qualities: default_rejected_qualities(),
        }
    }
}

fn default_min_distance() -> f64 {
    20.0
}

fn default_min_time() -> u64 {
    50_000
}

fn default_immediate_threshold() -> u64 {
    50_000
}

fn default_rejected_qualities() -> Vec<AccuracyQuality> {
    vec![
        AccuracyQuality::Medium,
        AccuracyQuality::Bad,
        AccuracyQuality::VeryBad,
    ]
}

/// Address cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum cache capacity (number of entries).
    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,

    /// Entry time to live in seconds.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    /// Time to live as a `Duration`.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: default_cache_max_size(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_cache_max_size() -> usize {
    50
}

fn default_cache_ttl() -> u64 {
    300 // 5 minutes
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> GuiaResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> GuiaResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            position: PositionConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    /// Checks values that serde cannot reject on its own.
    pub fn validate(&self) -> GuiaResult<()> {
        if self.cache.max_size == 0 {
            return Err(GuiaError::config("cache.max_size must be greater than zero"));
        }
        let distance = self.position.min_distance_meters;
        if !distance.is_finite() || distance < 0.0 {
            return Err(GuiaError::config(format!(
                "position.min_distance_meters must be a non-negative number, got {}",
                distance
            )));
        }
        if !matches!(self.general.log_format.as_str(), "text" | "json") {
            return Err(GuiaError::config(format!(
                "general.log_format must be 'text' or 'json', got '{}'",
                self.general.log_format
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
