//! Settings loading and saving
//!
//! Settings live in one pretty-printed JSON file. A missing or unreadable file
//! is never fatal: the caller gets defaults and a warning in the log.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use super::defaults::{SETTINGS_DIR_NAME, SETTINGS_FILE_NAME, SETTINGS_PATH_ENV};
use super::types::Settings;
use crate::error::{MacToolsError, Result};

/// Resolve the settings file path.
///
/// `MACTOOLS_SETTINGS` wins; otherwise `~/.mactools/settings.json`.
pub fn settings_path() -> PathBuf {
    if let Ok(custom) = std::env::var(SETTINGS_PATH_ENV) {
        if !custom.trim().is_empty() {
            return PathBuf::from(shellexpand::tilde(custom.trim()).as_ref());
        }
    }
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(SETTINGS_DIR_NAME)
        .join(SETTINGS_FILE_NAME)
}

/// Load settings from `path`.
///
/// Returns `Settings::default()` if the file is missing or malformed.
#[instrument(name = "load_settings", skip_all, fields(path = %path.display()))]
pub fn load_settings(path: &Path) -> Settings {
    if !path.exists() {
        info!("Settings file not found, using defaults");
        return Settings::default();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(error = %e, "Failed to read settings, using defaults");
            return Settings::default();
        }
    };

    match serde_json::from_str::<Settings>(&content) {
        Ok(settings) => {
            debug!(
                presets = settings.preset_window_sizes.len(),
                "Settings loaded"
            );
            settings
        }
        Err(e) => {
            warn!(error = %e, "Failed to parse settings JSON, using defaults");
            Settings::default()
        }
    }
}

/// Write settings atomically (temp file in the same directory, then rename).
#[instrument(name = "save_settings", skip_all, fields(path = %path.display()))]
pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| MacToolsError::Config(format!("{} has no parent", path.display())))?;
    fs::create_dir_all(dir).map_err(|e| MacToolsError::io(dir, e))?;

    let json = serde_json::to_string_pretty(settings)?;

    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp_path).map_err(|e| MacToolsError::io(&tmp_path, e))?;
        file.write_all(json.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| MacToolsError::io(&tmp_path, e))?;
    }
    fs::rename(&tmp_path, path).map_err(|e| MacToolsError::io(path, e))?;

    debug!(bytes = json.len(), "Settings saved");
    Ok(())
}
