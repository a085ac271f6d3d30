//! Platform-specific configuration and paths

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Directory name under the platform data directory
pub const APP_DIR_NAME: &str = "link-groups";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "LINK_GROUPS_DIR";

/// Get the default data directory
/// - macOS: ~/Library/Application Support/link-groups/
/// - Linux: ~/.local/share/link-groups/
/// - Windows: %APPDATA%/link-groups/
pub fn default_data_dir() -> Result<PathBuf> {
    let data = dirs::data_dir().context("Could not determine data directory")?;
    Ok(data.join(APP_DIR_NAME))
}

/// Pick the data directory: an explicit override wins over the platform default
pub fn resolve_data_dir(override_dir: Option<PathBuf>) -> Result<PathBuf> {
    match override_dir {
        Some(dir) => Ok(dir),
        None => default_data_dir(),
    }
}
