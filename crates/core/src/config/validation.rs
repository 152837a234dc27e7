//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache.max_entries` is 0
    /// - `cache.default_ttl_ms` is under 1 second
    /// - `monitor.debounce_delay_ms` or `monitor.throttle_delay_ms` is 0 or exceeds 10 minutes
    /// - `monitor.significant_change_threshold` falls outside [0, 1]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.max_entries == 0 {
            return Err(ConfigError::Invalid {
                field: "cache.max_entries".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.cache.default_ttl_ms < 1_000 {
            return Err(ConfigError::Invalid {
                field: "cache.default_ttl_ms".into(),
                reason: "must be at least 1000ms".into(),
            });
        }

        for (field, value) in [
            ("monitor.debounce_delay_ms", self.monitor.debounce_delay_ms),
            ("monitor.throttle_delay_ms", self.monitor.throttle_delay_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must be greater than 0".into() });
            }
            if value > 600_000 {
                return Err(ConfigError::Invalid {
                    field: field.into(),
                    reason: "must not exceed 10 minutes (600000ms)".into(),
                });
            }
        }

        let threshold = self.monitor.significant_change_threshold;
        if !(0.0..=1.0).contains(&threshold) || threshold.is_nan() {
            return Err(ConfigError::Invalid {
                field: "monitor.significant_change_threshold".into(),
                reason: "must lie in [0, 1]".into(),
            });
        }

        if self.monitor.throttle_delay_ms < self.monitor.debounce_delay_ms {
            tracing::warn!(
                throttle_ms = self.monitor.throttle_delay_ms,
                debounce_ms = self.monitor.debounce_delay_ms,
                "throttle_delay_ms is shorter than debounce_delay_ms; \
                 debounce will dominate flush timing"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_entries_zero() {
        let mut config = AppConfig::default();
        config.cache.max_entries = 0;
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache.max_entries"));
    }

    #[test]
    fn test_validate_ttl_too_small() {
        let mut config = AppConfig::default();
        config.cache.default_ttl_ms = 500;
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache.default_ttl_ms"));
    }

    #[test]
    fn test_validate_debounce_zero() {
        let mut config = AppConfig::default();
        config.monitor.debounce_delay_ms = 0;
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "monitor.debounce_delay_ms"));
    }

    #[test]
    fn test_validate_throttle_exceeds_limit() {
        let mut config = AppConfig::default();
        config.monitor.throttle_delay_ms = 601_000;
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "monitor.throttle_delay_ms"));
    }

    #[test]
    fn test_validate_threshold_out_of_range() {
        let mut config = AppConfig::default();
        config.monitor.significant_change_threshold = 1.5;
        let result = config.validate();
        assert!(
            matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "monitor.significant_change_threshold")
        );
    }

    #[test]
    fn test_validate_threshold_boundaries() {
        let mut config = AppConfig::default();
        config.monitor.significant_change_threshold = 0.0;
        assert!(config.validate().is_ok());
        config.monitor.significant_change_threshold = 1.0;
        assert!(config.validate().is_ok());
    }
}
