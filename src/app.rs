//! `MacTools`, the capability facade UI collaborators and the CLI talk to.
//!
//! Owns the settings, the shared services and one controller per feature.
//! Everything here is expected to run on the main thread.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::{PresetSize, Settings, SettingsStore};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::features::{
    DockMinimizer, Feature, FeatureController, PinToggle, ResizeTrigger, Services,
};
use crate::inventory::WindowRecord;
use crate::platform::{Platform, WindowId};
use crate::presets::PresetStore;
use crate::shortcuts::ShortcutBinding;

/// Accessibility permission as the settings screen shows it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
}

/// Per-feature snapshot for status displays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureStatus {
    pub feature: Feature,
    pub enabled: bool,
    pub running: bool,
    /// Display form of the shortcut; None for features without one
    pub shortcut: Option<String>,
}

pub struct MacTools {
    services: Services,
    presets: PresetStore,
    dock: DockMinimizer,
    resize: ResizeTrigger,
    pin: PinToggle,
}

impl MacTools {
    pub fn new(platform: Platform, settings: SettingsStore) -> Self {
        let settings = Arc::new(Mutex::new(settings));
        let services = Services::new(platform, settings.clone(), Diagnostics::new());
        Self {
            presets: PresetStore::new(settings),
            dock: DockMinimizer::new(services.clone()),
            resize: ResizeTrigger::new(services.clone()),
            pin: PinToggle::new(services.clone()),
            services,
        }
    }

    fn controller(&self, feature: Feature) -> &dyn FeatureController {
        match feature {
            Feature::DockMinimizer => &self.dock,
            Feature::ResizeTrigger => &self.resize,
            Feature::PinToggle => &self.pin,
        }
    }

    fn controller_mut(&mut self, feature: Feature) -> &mut dyn FeatureController {
        match feature {
            Feature::DockMinimizer => &mut self.dock,
            Feature::ResizeTrigger => &mut self.resize,
            Feature::PinToggle => &mut self.pin,
        }
    }

    /// Start every enabled feature. Failures leave that feature stopped and
    /// are returned so the caller can tell the user; the rest still start.
    #[instrument(skip(self))]
    pub fn start_all(&mut self) -> Vec<(Feature, crate::error::MacToolsError)> {
        let mut failures = Vec::new();
        for feature in Feature::ALL {
            if !self.is_enabled(feature) {
                info!(feature = feature.id(), "Feature disabled, not starting");
                continue;
            }
            if let Err(e) = self.start(feature) {
                warn!(feature = feature.id(), error = %e, "Feature failed to start");
                failures.push((feature, e));
            }
        }
        failures
    }

    pub fn stop_all(&mut self) {
        for feature in Feature::ALL {
            self.stop(feature);
        }
    }

    pub fn start(&mut self, feature: Feature) -> Result<()> {
        self.controller_mut(feature).start()
    }

    pub fn stop(&mut self, feature: Feature) {
        self.controller_mut(feature).stop()
    }

    pub fn restart(&mut self, feature: Feature) -> Result<()> {
        self.controller_mut(feature).restart()
    }

    pub fn is_running(&self, feature: Feature) -> bool {
        self.controller(feature).is_running()
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.services.is_enabled(feature)
    }

    /// Persist the flag. Enabling starts a stopped feature. Disabling the pin
    /// toggle releases its hot key; the tap-driven features stay installed and
    /// ignore input while disabled.
    pub fn set_enabled(&mut self, feature: Feature, enabled: bool) -> Result<()> {
        self.services
            .settings
            .lock()
            .update(|s| feature.set_enabled(s, enabled))?;
        info!(feature = feature.id(), enabled, "Feature flag changed");

        if enabled {
            if !self.is_running(feature) {
                self.start(feature)?;
            }
        } else if !feature.stays_installed_when_disabled() {
            self.stop(feature);
        }
        Ok(())
    }

    pub fn shortcut(&self, feature: Feature) -> Option<ShortcutBinding> {
        feature.shortcut(self.services.settings.lock().get())
    }

    /// Persist a new binding and restart the feature if it is running.
    pub fn set_shortcut(&mut self, feature: Feature, binding: ShortcutBinding) -> Result<()> {
        self.services
            .settings
            .lock()
            .update(|s| feature.set_shortcut(s, binding))??;
        info!(feature = feature.id(), shortcut = %binding, "Shortcut changed");
        if self.is_running(feature) {
            self.restart(feature)?;
        }
        Ok(())
    }

    pub fn permission_state(&self) -> PermissionState {
        if self.services.platform.accessibility.is_trusted() {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        }
    }

    /// Show the system Accessibility prompt
    pub fn request_permission(&self) -> PermissionState {
        if self.services.platform.accessibility.request_trust() {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        }
    }

    pub fn status(&self) -> Vec<FeatureStatus> {
        let settings = self.settings();
        Feature::ALL
            .iter()
            .map(|&feature| FeatureStatus {
                feature,
                enabled: feature.is_enabled(&settings),
                running: self.is_running(feature),
                shortcut: feature.shortcut(&settings).map(|b| b.display()),
            })
            .collect()
    }

    pub fn settings(&self) -> Settings {
        self.services.settings()
    }

    pub fn settings_path(&self) -> PathBuf {
        self.services.settings.lock().path().to_path_buf()
    }

    pub fn presets(&self) -> &PresetStore {
        &self.presets
    }

    pub fn preset_sizes(&self) -> Vec<PresetSize> {
        self.presets.list()
    }

    pub fn add_preset(&self, width: u32, height: u32) -> Result<PresetSize> {
        self.presets.add(width, height)
    }

    pub fn delete_presets(&self, indices: &BTreeSet<usize>) -> Result<usize> {
        self.presets.delete_indices(indices)
    }

    pub fn move_presets(&self, indices: &BTreeSet<usize>, to: usize) -> Result<()> {
        self.presets.move_items(indices, to)
    }

    pub fn update_preset(&self, id: Uuid, width: u32, height: u32) -> Result<bool> {
        self.presets.update(id, width, height)
    }

    pub fn reset_presets(&self) -> Result<()> {
        self.presets.reset_to_default()
    }

    /// Current window inventory without thumbnails
    pub fn windows(&self) -> Vec<WindowRecord> {
        self.services.inventory.enumerate(false)
    }

    /// Open the resize picker flow without the shortcut
    pub fn trigger_resize(&self) {
        self.resize.trigger();
    }

    pub fn toggle_pin(&self) -> Option<(WindowId, bool)> {
        self.pin.toggle_front_window()
    }

    pub fn pinned_windows(&self) -> Vec<WindowId> {
        self.services.pinned.lock().ids()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.services.diagnostics
    }

    /// Recent info-or-louder log lines, oldest first.
    pub fn recent_logs(&self) -> Vec<String> {
        crate::logging::get_recent_logs()
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
