//! CLI command implementations.

pub mod classify;
pub mod flags;

use remoteroster_core::PropertyStore;
use std::path::Path;

/// Open the property file given on the command line, or the default one.
pub fn open_properties(config: Option<&Path>) -> anyhow::Result<PropertyStore> {
    let store = match config {
        Some(path) => PropertyStore::open(path)?,
        None => PropertyStore::open_default()?,
    };
    Ok(store)
}
