//! Configuration for the scheduler
//!
//! Settings are stored as TOML and loaded through serde:
//! - Missing fields fall back to their defaults
//! - A default file is written when none exists
//! - The file can be reloaded at runtime
//!
//! # Example
//!
//! ```toml
//! version = 1
//! initial_capacity = 128
//! max_slots = 4096
//! slow_tick_warn_us = 500
//!
//! [clock]
//! time_scale = 1.0
//! max_delta = 0.25
//! ```

mod loader;

use std::path::Path;

use cadence_clock::ClockConfig;
use serde::{Deserialize, Serialize};

pub use loader::{base_dir, configs_dir, scheduler_config_path, CONFIG_PATH_ENV};

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Config parsed but holds unusable values
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Could not determine config directory
    #[error("Config directory not available - could not resolve base path")]
    NoConfigDirectory,
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Largest `initial_capacity` accepted; the pool grows past it on demand
pub const MAX_INITIAL_CAPACITY: usize = 1 << 16;

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Slots and list capacity reserved up front
    pub initial_capacity: usize,

    /// Hard cap on pool slots; unbounded when absent
    pub max_slots: Option<u32>,

    /// Warn when a tick takes longer than this many microseconds (0 disables)
    pub slow_tick_warn_us: u64,

    /// Capacity of the cross-thread command queue
    pub remote_capacity: usize,

    /// Remote commands processed per tick at most
    pub max_remote_commands_per_tick: usize,

    /// Frame clock settings
    pub clock: ClockConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            initial_capacity: 64,
            max_slots: None,
            slow_tick_warn_us: 1000,
            remote_capacity: 1024,
            max_remote_commands_per_tick: 1024,
            clock: ClockConfig::default(),
        }
    }
}

impl SchedulerConfig {
    /// Parse config from a TOML string and validate it
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that would make the scheduler misbehave
    pub fn validate(&self) -> ConfigResult<()> {
        if self.remote_capacity == 0 {
            return Err(ConfigError::Invalid(
                "remote_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_remote_commands_per_tick == 0 {
            return Err(ConfigError::Invalid(
                "max_remote_commands_per_tick must be at least 1".to_string(),
            ));
        }
        if self.max_slots == Some(0) {
            return Err(ConfigError::Invalid("max_slots must be at least 1".to_string()));
        }
        if self.initial_capacity > MAX_INITIAL_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "initial_capacity must be at most {}",
                MAX_INITIAL_CAPACITY
            )));
        }
        self.clock
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Capacity reserved up front, bounded by `max_slots` and [`MAX_INITIAL_CAPACITY`]
    pub fn reserved_capacity(&self) -> usize {
        let limit = self.max_slots.map_or(usize::MAX, |max| max as usize);
        self.initial_capacity.min(limit).min(MAX_INITIAL_CAPACITY)
    }

    /// Load config from file, creating default if missing.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config = Self::from_toml_str(&content)?;
            tracing::debug!("Loaded scheduler config from {:?}", path);
            Ok(config)
        } else {
            let default = Self::default();
            default.save(path)?;
            tracing::info!("Created default scheduler config at {:?}", path);
            Ok(default)
        }
    }

    /// Load config from the default location (see [`scheduler_config_path`])
    pub fn load_default() -> ConfigResult<Self> {
        Self::load(&scheduler_config_path()?)
    }

    /// Save config to file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("Saved scheduler config to {:?}", path);
        Ok(())
    }

    /// Reload config from file.
    ///
    /// Leaves `self` untouched if the file fails to parse or validate.
    pub fn reload(&mut self, path: &Path) -> ConfigResult<()> {
        let content = std::fs::read_to_string(path)?;
        *self = Self::from_toml_str(&content)?;
        tracing::debug!("Reloaded scheduler config from {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("cadence-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.version, 1);
        assert_eq!(config.initial_capacity, 64);
        assert!(config.max_slots.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SchedulerConfig::from_toml_str(
            r#"
            max_slots = 16

            [clock]
            time_scale = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.max_slots, Some(16));
        assert_eq!(config.clock.time_scale, 0.5);
        assert_eq!(config.initial_capacity, 64);
        assert_eq!(config.remote_capacity, 1024);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            SchedulerConfig::from_toml_str("remote_capacity = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SchedulerConfig::from_toml_str("[clock]\ntime_scale = -2.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SchedulerConfig::from_toml_str("max_slots = \"many\""),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_huge_initial_capacity_rejected() {
        let result =
            SchedulerConfig::from_toml_str("initial_capacity = 9223372036854775807\nmax_slots = 4");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_reserved_capacity_bounded() {
        let config = SchedulerConfig {
            initial_capacity: usize::MAX,
            max_slots: Some(4),
            ..SchedulerConfig::default()
        };
        assert_eq!(config.reserved_capacity(), 4);

        let config = SchedulerConfig {
            initial_capacity: usize::MAX,
            ..SchedulerConfig::default()
        };
        assert_eq!(config.reserved_capacity(), MAX_INITIAL_CAPACITY);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = SchedulerConfig {
            max_slots: Some(256),
            slow_tick_warn_us: 0,
            ..SchedulerConfig::default()
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("max_slots = 256"));
        assert!(toml_str.contains("[clock]"));
        assert_eq!(SchedulerConfig::from_toml_str(&toml_str).unwrap(), config);
    }

    #[test]
    fn test_load_creates_default_then_reloads() {
        let path = temp_path("load/scheduler.toml");
        let _ = std::fs::remove_file(&path);

        let config = SchedulerConfig::load(&path).unwrap();
        assert_eq!(config, SchedulerConfig::default());
        assert!(path.exists());

        std::fs::write(&path, "initial_capacity = 8\n").unwrap();
        let mut config = config;
        config.reload(&path).unwrap();
        assert_eq!(config.initial_capacity, 8);

        std::fs::write(&path, "remote_capacity = 0\n").unwrap();
        assert!(config.reload(&path).is_err());
        assert_eq!(config.initial_capacity, 8);

        let _ = std::fs::remove_file(&path);
    }
}
