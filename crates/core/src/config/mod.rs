//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PAGELENS_*)
//! 2. TOML config file (if PAGELENS_CONFIG_FILE set)
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Artifact cache tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached entries; oldest insertions are evicted first.
    ///
    /// Set via PAGELENS_CACHE__MAX_ENTRIES.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Freshness window applied when `set` is called without an explicit TTL.
    ///
    /// Set via PAGELENS_CACHE__DEFAULT_TTL_MS.
    #[serde(default = "default_ttl_ms")]
    pub default_ttl_ms: u64,

    /// Compact stored artifacts to shrink memory use.
    ///
    /// Set via PAGELENS_CACHE__COMPRESSION_ENABLED.
    #[serde(default)]
    pub compression_enabled: bool,
}

/// Change monitor scheduling and observation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Quiet period before buffered low-signal activity is flushed.
    ///
    /// Set via PAGELENS_MONITOR__DEBOUNCE_DELAY_MS.
    #[serde(default = "default_debounce_ms")]
    pub debounce_delay_ms: u64,

    /// Minimum interval between flushes during sustained significant activity.
    ///
    /// Set via PAGELENS_MONITOR__THROTTLE_DELAY_MS.
    #[serde(default = "default_throttle_ms")]
    pub throttle_delay_ms: u64,

    /// Attach structural-change signal sources on start.
    #[serde(default = "default_true")]
    pub enable_structural_observer: bool,

    /// Attach scroll signal sources on start.
    #[serde(default = "default_true")]
    pub enable_scroll_observer: bool,

    /// Attach resize signal sources on start.
    #[serde(default = "default_true")]
    pub enable_resize_observer: bool,

    /// Significance score in [0, 1] at or above which a structural change
    /// is considered significant.
    ///
    /// Set via PAGELENS_MONITOR__SIGNIFICANT_CHANGE_THRESHOLD.
    #[serde(default = "default_threshold")]
    pub significant_change_threshold: f64,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PAGELENS_*)
/// 2. TOML config file (if PAGELENS_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,
}

fn default_max_entries() -> usize {
    50
}

fn default_ttl_ms() -> u64 {
    1_800_000 // 30 minutes
}

fn default_debounce_ms() -> u64 {
    2_000
}

fn default_throttle_ms() -> u64 {
    5_000
}

fn default_threshold() -> f64 {
    0.1
}

fn default_true() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            default_ttl_ms: default_ttl_ms(),
            compression_enabled: false,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            debounce_delay_ms: default_debounce_ms(),
            throttle_delay_ms: default_throttle_ms(),
            enable_structural_observer: true,
            enable_scroll_observer: true,
            enable_resize_observer: true,
            significant_change_threshold: default_threshold(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { cache: CacheConfig::default(), monitor: MonitorConfig::default() }
    }
}

impl CacheConfig {
    /// Default TTL as a Duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }
}

impl MonitorConfig {
    /// Debounce delay as a Duration.
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }

    /// Throttle delay as a Duration.
    pub fn throttle_delay(&self) -> Duration {
        Duration::from_millis(self.throttle_delay_ms)
    }
}

impl AppConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PAGELENS_`
    /// 2. TOML file from `PAGELENS_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PAGELENS_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PAGELENS_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache.max_entries, 50);
        assert_eq!(config.cache.default_ttl_ms, 1_800_000);
        assert!(!config.cache.compression_enabled);
        assert_eq!(config.monitor.debounce_delay_ms, 2_000);
        assert_eq!(config.monitor.throttle_delay_ms, 5_000);
        assert!(config.monitor.enable_structural_observer);
        assert!(config.monitor.enable_scroll_observer);
        assert!(config.monitor.enable_resize_observer);
        assert_eq!(config.monitor.significant_change_threshold, 0.1);
    }

    #[test]
    fn test_duration_accessors() {
        let config = AppConfig::default();
        assert_eq!(config.cache.default_ttl(), Duration::from_millis(1_800_000));
        assert_eq!(config.monitor.debounce_delay(), Duration::from_millis(2_000));
        assert_eq!(config.monitor.throttle_delay(), Duration::from_millis(5_000));
    }
}
