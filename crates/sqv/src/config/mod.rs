//! Configuration for sqv.
//!
//! Values come from built-in defaults overlaid with
//! `~/.config/sqv/config.toml` when that file exists.

mod schema;

pub use schema::{Config, DisplayConfig, ExportConfig, InspectConfig, SqlConfig};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Returns the config directory path.
///
/// Checks `SQV_CONFIG_DIR` first, then falls back to the system default
/// (~/.config/sqv on Linux/macOS).
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("SQV_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|p| p.join("sqv"))
}

/// Returns the default config file path (~/.config/sqv/config.toml)
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

/// Returns the log file path (~/.config/sqv/sqv.log)
pub fn log_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("sqv.log"))
}

/// Load configuration from the default path or return defaults
pub fn load_config() -> Result<Config> {
    match config_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => Ok(Config::default()),
    }
}

/// Load configuration from a specific path
pub fn load_config_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}
