//! Configuration type definitions
//!
//! This module contains all the struct definitions for persisted settings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::defaults::*;
use crate::shortcuts::ShortcutBinding;

// ============================================
// PRESET SIZES
// ============================================

/// One entry of the size picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetSize {
    pub id: Uuid,
    pub width: u32,
    pub height: u32,
}

impl PresetSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            width,
            height,
        }
    }

    /// `1280×720`
    pub fn label(&self) -> String {
        format!("{}×{}", self.width, self.height)
    }
}

pub fn default_preset_sizes() -> Vec<PresetSize> {
    DEFAULT_PRESET_SIZES
        .iter()
        .map(|&(w, h)| PresetSize::new(w, h))
        .collect()
}

// ============================================
// TIMING
// ============================================

/// Settle delays used in place of change notifications from target apps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingConfig {
    /// Delay before the dock minimizer re-counts windows (default: 250)
    #[serde(default = "default_dock_recheck_delay_ms")]
    pub dock_recheck_delay_ms: u64,
    /// Pause between the position write and the size write (default: 100)
    #[serde(default = "default_move_resize_settle_ms")]
    pub move_resize_settle_ms: u64,
    /// Pause after activating the target app before matching its windows (default: 200)
    #[serde(default = "default_activation_settle_ms")]
    pub activation_settle_ms: u64,
    /// Delay before the pin toggle restores focus (default: 100)
    #[serde(default = "default_focus_restore_delay_ms")]
    pub focus_restore_delay_ms: u64,
}

fn default_dock_recheck_delay_ms() -> u64 {
    DEFAULT_DOCK_RECHECK_DELAY_MS
}
fn default_move_resize_settle_ms() -> u64 {
    DEFAULT_MOVE_RESIZE_SETTLE_MS
}
fn default_activation_settle_ms() -> u64 {
    DEFAULT_ACTIVATION_SETTLE_MS
}
fn default_focus_restore_delay_ms() -> u64 {
    DEFAULT_FOCUS_RESTORE_DELAY_MS
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            dock_recheck_delay_ms: DEFAULT_DOCK_RECHECK_DELAY_MS,
            move_resize_settle_ms: DEFAULT_MOVE_RESIZE_SETTLE_MS,
            activation_settle_ms: DEFAULT_ACTIVATION_SETTLE_MS,
            focus_restore_delay_ms: DEFAULT_FOCUS_RESTORE_DELAY_MS,
        }
    }
}

// ============================================
// MATCHING
// ============================================

/// Tolerances for re-identifying an inventory window among live AX windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingConfig {
    #[serde(default = "default_position_tolerance")]
    pub position_tolerance: f64,
    #[serde(default = "default_size_tolerance")]
    pub size_tolerance: f64,
    /// Tighter tolerance used when only the size is compared
    #[serde(default = "default_size_only_tolerance")]
    pub size_only_tolerance: f64,
}

fn default_position_tolerance() -> f64 {
    DEFAULT_POSITION_TOLERANCE
}
fn default_size_tolerance() -> f64 {
    DEFAULT_SIZE_TOLERANCE
}
fn default_size_only_tolerance() -> f64 {
    DEFAULT_SIZE_ONLY_TOLERANCE
}

impl Default for MatchingConfig {
    fn default() -> Self {
        MatchingConfig {
            position_tolerance: DEFAULT_POSITION_TOLERANCE,
            size_tolerance: DEFAULT_SIZE_TOLERANCE,
            size_only_tolerance: DEFAULT_SIZE_ONLY_TOLERANCE,
        }
    }
}

// ============================================
// INVENTORY
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryConfig {
    #[serde(default = "default_min_window_width")]
    pub min_window_width: f64,
    #[serde(default = "default_min_window_height")]
    pub min_window_height: f64,
    /// Width thumbnails are scaled to; height keeps the aspect ratio
    #[serde(default = "default_thumbnail_width")]
    pub thumbnail_width: u32,
    #[serde(default = "default_excluded_bundle_ids")]
    pub excluded_bundle_ids: Vec<String>,
}

fn default_min_window_width() -> f64 {
    DEFAULT_MIN_WINDOW_WIDTH
}
fn default_min_window_height() -> f64 {
    DEFAULT_MIN_WINDOW_HEIGHT
}
fn default_thumbnail_width() -> u32 {
    DEFAULT_THUMBNAIL_WIDTH
}
fn default_excluded_bundle_ids() -> Vec<String> {
    DEFAULT_EXCLUDED_BUNDLE_IDS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for InventoryConfig {
    fn default() -> Self {
        InventoryConfig {
            min_window_width: DEFAULT_MIN_WINDOW_WIDTH,
            min_window_height: DEFAULT_MIN_WINDOW_HEIGHT,
            thumbnail_width: DEFAULT_THUMBNAIL_WIDTH,
            excluded_bundle_ids: default_excluded_bundle_ids(),
        }
    }
}

// ============================================
// SETTINGS
// ============================================

/// Everything MacTools persists between launches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_dock_toggle_enabled")]
    pub dock_toggle_enabled: bool,
    #[serde(default = "default_window_resizer_enabled")]
    pub window_resizer_enabled: bool,
    #[serde(default = "default_window_pin_enabled")]
    pub window_pin_enabled: bool,
    #[serde(default = "default_resizer_shortcut")]
    pub window_resizer_shortcut: ShortcutBinding,
    #[serde(default = "default_pin_shortcut")]
    pub window_pin_shortcut: ShortcutBinding,
    #[serde(default = "default_preset_sizes")]
    pub preset_window_sizes: Vec<PresetSize>,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
}

fn default_dock_toggle_enabled() -> bool {
    DEFAULT_DOCK_TOGGLE_ENABLED
}
fn default_window_resizer_enabled() -> bool {
    DEFAULT_WINDOW_RESIZER_ENABLED
}
fn default_window_pin_enabled() -> bool {
    DEFAULT_WINDOW_PIN_ENABLED
}
fn default_resizer_shortcut() -> ShortcutBinding {
    ShortcutBinding::new(DEFAULT_RESIZER_KEY_CODE, DEFAULT_SHORTCUT_MODIFIERS)
}
fn default_pin_shortcut() -> ShortcutBinding {
    ShortcutBinding::new(DEFAULT_PIN_KEY_CODE, DEFAULT_SHORTCUT_MODIFIERS)
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            dock_toggle_enabled: DEFAULT_DOCK_TOGGLE_ENABLED,
            window_resizer_enabled: DEFAULT_WINDOW_RESIZER_ENABLED,
            window_pin_enabled: DEFAULT_WINDOW_PIN_ENABLED,
            window_resizer_shortcut: default_resizer_shortcut(),
            window_pin_shortcut: default_pin_shortcut(),
            preset_window_sizes: default_preset_sizes(),
            timing: TimingConfig::default(),
            matching: MatchingConfig::default(),
            inventory: InventoryConfig::default(),
        }
    }
}
