//! OS hot-key registration for bound shortcuts.

use std::sync::Arc;

use tracing::{info, warn};

use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::platform::{HotKeyCallback, HotKeys, RegisteredHotKey};
use crate::shortcuts::ShortcutBinding;

/// A registered hot key; unregisters on drop.
pub struct HotKeyHandle {
    binding: ShortcutBinding,
    registration: Option<Box<dyn RegisteredHotKey>>,
}

impl HotKeyHandle {
    pub fn binding(&self) -> ShortcutBinding {
        self.binding
    }

    pub fn unregister(&mut self) {
        if let Some(mut registration) = self.registration.take() {
            registration.unregister();
            info!(shortcut = %self.binding, "Hot key unregistered");
        }
    }
}

impl Drop for HotKeyHandle {
    fn drop(&mut self) {
        self.unregister();
    }
}

#[derive(Clone)]
pub struct HotKeyRegistrar {
    hot_keys: Arc<dyn HotKeys>,
    diagnostics: Diagnostics,
}

impl HotKeyRegistrar {
    pub fn new(hot_keys: Arc<dyn HotKeys>, diagnostics: Diagnostics) -> Self {
        Self {
            hot_keys,
            diagnostics,
        }
    }

    /// Register `binding`. An unbound binding is never handed to the OS and
    /// yields `Ok(None)`.
    pub fn register(
        &self,
        feature: &'static str,
        binding: ShortcutBinding,
        on_press: HotKeyCallback,
    ) -> Result<Option<HotKeyHandle>> {
        if !binding.is_bound() {
            info!(feature, "Shortcut unbound, no hot key registered");
            return Ok(None);
        }
        match self.hot_keys.register(&binding, on_press) {
            Ok(registration) => {
                info!(feature, shortcut = %binding, "Hot key registered");
                Ok(Some(HotKeyHandle {
                    binding,
                    registration: Some(registration),
                }))
            }
            Err(e) => {
                warn!(feature, shortcut = %binding, error = %e, "Hot key registration failed");
                self.diagnostics.record_error(feature, &e);
                Err(e)
            }
        }
    }
}
