//! Owned settings with write-through persistence.

use std::path::{Path, PathBuf};

use super::loader::{load_settings, save_settings};
use super::types::Settings;
use crate::error::{Result, ResultExt};

/// In-memory settings bound to the file they came from.
///
/// Every mutation goes through [`SettingsStore::update`], which saves before
/// returning so the file never lags behind what the features see.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Load `path`, writing the defaults out when no file exists yet so the
    /// default preset ids stay the same across processes.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let missing = !path.exists();
        let settings = load_settings(&path);
        if missing {
            save_settings(&path, &settings).warn_on_err();
        }
        Self { path, settings }
    }

    /// Store that starts from `settings` without reading the file.
    pub fn with_settings(path: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            path: path.into(),
            settings,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Apply `f` and persist. The in-memory change stays even if the write
    /// fails; the error is returned for the caller to surface.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut Settings) -> R) -> Result<R> {
        let out = f(&mut self.settings);
        save_settings(&self.path, &self.settings)?;
        Ok(out)
    }
}
