//! Config path resolution
//!
//! The scheduler config lives next to the host executable unless
//! overridden through the environment.

use std::path::PathBuf;

use super::{ConfigError, ConfigResult};

/// Environment variable pointing at an explicit config file
pub const CONFIG_PATH_ENV: &str = "CADENCE_CONFIG";

/// Returns the directory containing the host executable.
pub fn base_dir() -> ConfigResult<PathBuf> {
    let exe = std::env::current_exe().map_err(ConfigError::IoError)?;
    exe.parent()
        .map(PathBuf::from)
        .ok_or(ConfigError::NoConfigDirectory)
}

/// Returns the configs directory.
///
/// Path: `{exe_dir}/configs/`
pub fn configs_dir() -> ConfigResult<PathBuf> {
    Ok(base_dir()?.join("configs"))
}

/// Returns the scheduler config path.
///
/// `$CADENCE_CONFIG` when set, otherwise `{exe_dir}/configs/scheduler.toml`
pub fn scheduler_config_path() -> ConfigResult<PathBuf> {
    match std::env::var_os(CONFIG_PATH_ENV) {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => Ok(configs_dir()?.join("scheduler.toml")),
    }
}
