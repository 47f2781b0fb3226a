//! Feature controllers.
//!
//! Each controller owns its event tap or hot key and the timers it issued.
//! `start` acquires them, `stop` releases them and cancels pending timers;
//! `restart` is used whenever the user rebinds a shortcut.

mod dock_minimizer;
mod pin_toggle;
mod resize_trigger;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;

pub use dock_minimizer::DockMinimizer;
pub use pin_toggle::PinToggle;
pub use resize_trigger::ResizeTrigger;

use crate::config::{Settings, SettingsStore};
use crate::diagnostics::Diagnostics;
use crate::error::{MacToolsError, Result};
use crate::event_monitor::GlobalEventMonitor;
use crate::hotkey::HotKeyRegistrar;
use crate::inventory::WindowInventory;
use crate::mutation::WindowMutator;
use crate::pinning::PinnedWindowSet;
use crate::platform::Platform;
use crate::resolution::ElementResolver;
use crate::shortcuts::ShortcutBinding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    DockMinimizer,
    ResizeTrigger,
    PinToggle,
}

impl Feature {
    pub const ALL: [Feature; 3] = [
        Feature::DockMinimizer,
        Feature::ResizeTrigger,
        Feature::PinToggle,
    ];

    /// Identifier used in logs and diagnostics
    pub fn id(&self) -> &'static str {
        match self {
            Feature::DockMinimizer => "dock_minimizer",
            Feature::ResizeTrigger => "resize_trigger",
            Feature::PinToggle => "pin_toggle",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Feature::DockMinimizer => "Dock click minimizer",
            Feature::ResizeTrigger => "Window resizer",
            Feature::PinToggle => "Window pin",
        }
    }

    pub fn is_enabled(&self, settings: &Settings) -> bool {
        match self {
            Feature::DockMinimizer => settings.dock_toggle_enabled,
            Feature::ResizeTrigger => settings.window_resizer_enabled,
            Feature::PinToggle => settings.window_pin_enabled,
        }
    }

    pub fn set_enabled(&self, settings: &mut Settings, enabled: bool) {
        match self {
            Feature::DockMinimizer => settings.dock_toggle_enabled = enabled,
            Feature::ResizeTrigger => settings.window_resizer_enabled = enabled,
            Feature::PinToggle => settings.window_pin_enabled = enabled,
        }
    }

    /// The shortcut a hot-key driven feature listens for
    pub fn shortcut(&self, settings: &Settings) -> Option<ShortcutBinding> {
        match self {
            Feature::DockMinimizer => None,
            Feature::ResizeTrigger => Some(settings.window_resizer_shortcut),
            Feature::PinToggle => Some(settings.window_pin_shortcut),
        }
    }

    pub fn set_shortcut(&self, settings: &mut Settings, binding: ShortcutBinding) -> Result<()> {
        match self {
            Feature::DockMinimizer => {
                return Err(MacToolsError::Config(
                    "the dock minimizer has no shortcut".to_string(),
                ))
            }
            Feature::ResizeTrigger => settings.window_resizer_shortcut = binding,
            Feature::PinToggle => settings.window_pin_shortcut = binding,
        }
        Ok(())
    }

    /// Whether a disabled feature keeps its tap installed but inert rather
    /// than tearing it down
    pub fn stays_installed_when_disabled(&self) -> bool {
        !matches!(self, Feature::PinToggle)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Feature {
    type Err = MacToolsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "dock" | "dock_minimizer" | "dock-minimizer" => Ok(Feature::DockMinimizer),
            "resize" | "resizer" | "resize_trigger" | "resize-trigger" => {
                Ok(Feature::ResizeTrigger)
            }
            "pin" | "pin_toggle" | "pin-toggle" => Ok(Feature::PinToggle),
            other => Err(MacToolsError::Config(format!("unknown feature '{}'", other))),
        }
    }
}

/// Lifecycle shared by all feature controllers
pub trait FeatureController: Send {
    fn feature(&self) -> Feature;

    /// stopped -> running. Idempotent while running.
    fn start(&mut self) -> Result<()>;

    /// running -> stopped. Cancels timers the controller issued.
    fn stop(&mut self);

    fn restart(&mut self) -> Result<()> {
        self.stop();
        self.start()
    }

    fn is_running(&self) -> bool;
}

/// Services the controllers share, explicitly constructed and injected
#[derive(Clone)]
pub struct Services {
    pub platform: Platform,
    pub settings: Arc<Mutex<SettingsStore>>,
    pub diagnostics: Diagnostics,
    pub monitor: GlobalEventMonitor,
    pub hot_keys: HotKeyRegistrar,
    pub resolver: ElementResolver,
    pub inventory: WindowInventory,
    pub mutator: WindowMutator,
    pub pinned: Arc<Mutex<PinnedWindowSet>>,
}

impl Services {
    pub fn new(
        platform: Platform,
        settings: Arc<Mutex<SettingsStore>>,
        diagnostics: Diagnostics,
    ) -> Self {
        let monitor = GlobalEventMonitor::new(platform.input_taps.clone(), diagnostics.clone());
        let hot_keys = HotKeyRegistrar::new(platform.hot_keys.clone(), diagnostics.clone());
        let resolver = ElementResolver::new(
            platform.accessibility.clone(),
            platform.workspace.clone(),
            diagnostics.clone(),
        );
        let inventory = WindowInventory::new(
            platform.window_server.clone(),
            platform.workspace.clone(),
            settings.clone(),
            diagnostics.clone(),
        );
        let mutator = WindowMutator::new(
            platform.accessibility.clone(),
            platform.workspace.clone(),
            platform.executor.clone(),
            settings.clone(),
            diagnostics.clone(),
        );
        Self {
            platform,
            settings,
            diagnostics,
            monitor,
            hot_keys,
            resolver,
            inventory,
            mutator,
            pinned: Arc::new(Mutex::new(PinnedWindowSet::new())),
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings.lock().get().clone()
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        feature.is_enabled(self.settings.lock().get())
    }

    /// Accessibility trust, recording a denial for `source` when missing
    pub fn require_trust(&self, source: &'static str) -> bool {
        if self.platform.accessibility.is_trusted() {
            return true;
        }
        self.diagnostics.record_error(
            source,
            &MacToolsError::PermissionDenied {
                capability: "Accessibility",
            },
        );
        false
    }
}
