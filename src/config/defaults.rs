//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

use crate::shortcuts::keycodes::{KEY_T, KEY_W};
use crate::shortcuts::ModifierFlags;

/// Default feature flags
pub const DEFAULT_DOCK_TOGGLE_ENABLED: bool = true;
pub const DEFAULT_WINDOW_RESIZER_ENABLED: bool = true;
pub const DEFAULT_WINDOW_PIN_ENABLED: bool = true;

/// Default hot keys (⌘⇧W and ⌘⇧T)
pub const DEFAULT_RESIZER_KEY_CODE: u16 = KEY_W;
pub const DEFAULT_PIN_KEY_CODE: u16 = KEY_T;
pub const DEFAULT_SHORTCUT_MODIFIERS: ModifierFlags =
    ModifierFlags::COMMAND.union(ModifierFlags::SHIFT);

/// Preset window sizes seeded on first launch and by "reset to default"
pub const DEFAULT_PRESET_SIZES: &[(u32, u32)] = &[
    (640, 360),
    (800, 500),
    (960, 540),
    (1024, 640),
    (1280, 720),
    (1280, 800),
    (1360, 765),
    (1440, 900),
    (1600, 900),
    (1600, 1000),
];

/// Settle delays (milliseconds)
pub const DEFAULT_DOCK_RECHECK_DELAY_MS: u64 = 250;
pub const DEFAULT_MOVE_RESIZE_SETTLE_MS: u64 = 100;
pub const DEFAULT_ACTIVATION_SETTLE_MS: u64 = 200;
pub const DEFAULT_FOCUS_RESTORE_DELAY_MS: u64 = 100;

/// Geometry matching tolerances (screen points)
pub const DEFAULT_POSITION_TOLERANCE: f64 = 20.0;
pub const DEFAULT_SIZE_TOLERANCE: f64 = 20.0;
pub const DEFAULT_SIZE_ONLY_TOLERANCE: f64 = 5.0;

/// Window inventory filtering
pub const DEFAULT_MIN_WINDOW_WIDTH: f64 = 100.0;
pub const DEFAULT_MIN_WINDOW_HEIGHT: f64 = 100.0;
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 400;

/// System-shell surfaces that never show up in the window picker
pub const DEFAULT_EXCLUDED_BUNDLE_IDS: &[&str] = &[
    "com.apple.dock",
    "com.apple.controlcenter",
    "com.apple.notificationcenterui",
    "com.apple.WindowManager",
    "com.apple.Spotlight",
];

/// Settings file location, relative to the home directory
pub const SETTINGS_DIR_NAME: &str = ".mactools";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Environment variable overriding the settings file path
pub const SETTINGS_PATH_ENV: &str = "MACTOOLS_SETTINGS";
