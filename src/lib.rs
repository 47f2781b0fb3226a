//! MacTools - a menu-bar utility of three window features for macOS:
//! minimize the frontmost app by clicking its Dock icon, resize a picked
//! window to a preset size, and keep the front window pinned above others.
//!
//! The core is platform-neutral and talks to the OS through the traits in
//! [`platform`]; the `macos` backend provides the live implementation.

pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod event_monitor;
pub mod executor;
pub mod features;
pub mod geometry;
pub mod hotkey;
pub mod inventory;
pub mod logging;
pub mod mutation;
pub mod pinning;
pub mod platform;
pub mod presets;
pub mod resolution;
pub mod shortcuts;

#[cfg(test)]
mod testing;

pub use app::{FeatureStatus, MacTools, PermissionState};
pub use error::{MacToolsError, Result};
pub use features::Feature;
