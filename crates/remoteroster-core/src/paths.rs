//! Path resolution utilities.

use crate::error::ConfigError;
use std::path::PathBuf;

/// Get the RemoteRoster base directory (~/.remoteroster).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".remoteroster"))
}

/// Get the property file path (~/.remoteroster/properties.json5).
pub fn properties_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("properties.json5"))
}
