//! Settings loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::settings::{ServerSettings, SettingsError};

/// Error type for settings loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    Validation(#[from] SettingsError),
}

/// Load and validate server settings from a TOML file.
///
/// Deserialization writes fields directly, so validation always runs before
/// the settings are handed out; an invalid file is refused here rather than
/// surfacing as undefined throttle behavior later.
pub fn load_settings(path: &Path) -> Result<ServerSettings, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_settings(&content)
}

/// Parse and validate server settings from a TOML string.
pub fn parse_settings(content: &str) -> Result<ServerSettings, ConfigError> {
    let settings: ServerSettings = toml::from_str(content)?;
    settings.validate()?;
    Ok(settings)
}
