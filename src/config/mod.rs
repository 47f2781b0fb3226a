//! Configuration module - persisted settings
//!
//! This module provides functionality for:
//! - Loading settings from ~/.mactools/settings.json
//! - Default values for all settings
//! - Type definitions for settings structures
//! - Write-through persistence for every change
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - Settings struct definitions (Settings, TimingConfig, etc.)
//! - `loader` - File system loading and atomic saving
//! - `store` - `SettingsStore`, settings bound to their file

mod defaults;
mod loader;
mod store;
mod types;

pub use defaults::DEFAULT_PRESET_SIZES;

pub use types::{
    default_preset_sizes, InventoryConfig, MatchingConfig, PresetSize, Settings, TimingConfig,
};

pub use loader::{load_settings, save_settings, settings_path};
pub use store::SettingsStore;

#[cfg(test)]
pub use defaults::{
    DEFAULT_DOCK_RECHECK_DELAY_MS, DEFAULT_EXCLUDED_BUNDLE_IDS, DEFAULT_PIN_KEY_CODE,
    DEFAULT_RESIZER_KEY_CODE, DEFAULT_SHORTCUT_MODIFIERS,
};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
