//! Property file loading and persistence.

use super::PropertyStore;
use crate::error::ConfigError;
use crate::paths;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

impl PropertyStore {
    /// Open the default property file, creating an empty store if it does
    /// not exist yet.
    pub fn open_default() -> Result<Self, ConfigError> {
        let path = paths::properties_file()?;
        Self::open(&path)
    }

    /// Open a property file for reading and auto-saving. A missing file
    /// yields an empty store bound to `path`.
    pub fn open(path: &Path) -> Result<Self, ConfigError> {
        let properties = if path.exists() {
            let content = fs::read_to_string(path)?;
            parse_properties(&content)?
        } else {
            BTreeMap::new()
        };
        Ok(Self::with_properties(properties, Some(path.to_path_buf())))
    }

    /// Load a property file. The returned store does not auto-save.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse properties from a JSON5 object.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(Self::with_properties(parse_properties(content)?, None))
    }

    /// Save all properties to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        write_properties(path, &self.snapshot())
    }
}

/// Parse a JSON5 object, stringifying scalar values.
fn parse_properties(content: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let raw: BTreeMap<String, serde_json::Value> =
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))?;

    raw.into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                other => {
                    return Err(ConfigError::Parse(format!(
                        "Property '{}' must be a scalar, got {}",
                        key, other
                    )))
                }
            };
            Ok((key, value))
        })
        .collect()
}

fn render(properties: &BTreeMap<String, String>) -> Result<String, ConfigError> {
    // json5 has no serializer; JSON is valid JSON5.
    serde_json::to_string_pretty(properties).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Write properties atomically.
pub(super) fn write_properties(
    path: &Path,
    properties: &BTreeMap<String, String>,
) -> Result<(), ConfigError> {
    let content = render(properties)?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Write atomically
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, &content)?;
    fs::rename(&temp_path, path)?;

    Ok(())
}
