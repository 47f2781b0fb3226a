//! Global hot keys through `global-hotkey` (Carbon `RegisterEventHotKey`).

use std::collections::HashMap;
use std::sync::{Arc, Once};

use global_hotkey::hotkey::HotKey;
use global_hotkey::{Error as HotkeyError, GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::dispatch::GcdExecutor;
use super::ensure_main_thread;
use crate::error::{MacToolsError, Result};
use crate::executor::Executor;
use crate::platform::{HotKeyCallback, HotKeys, RegisteredHotKey};
use crate::shortcuts::{to_hotkey, ShortcutBinding};

type Handlers = Arc<Mutex<HashMap<u32, HotKeyCallback>>>;

/// Format a registration error with the context a user needs
fn describe_error(e: &HotkeyError) -> String {
    match e {
        HotkeyError::AlreadyRegistered(hk) => {
            format!("already registered by another application (id {})", hk.id())
        }
        HotkeyError::FailedToRegister(msg) => format!("rejected by the system: {}", msg),
        HotkeyError::OsError(os_err) => format!("OS error: {}", os_err),
        other => other.to_string(),
    }
}

struct Manager(GlobalHotKeyManager);

// The manager is created and used on the main thread only
unsafe impl Send for Manager {}
unsafe impl Sync for Manager {}

pub struct MacHotKeys {
    manager: Arc<Mutex<Manager>>,
    handlers: Handlers,
    listener: Once,
}

impl MacHotKeys {
    /// Must be called on the main thread.
    pub fn new() -> Result<Self> {
        ensure_main_thread("GlobalHotKeyManager::new");
        let manager = GlobalHotKeyManager::new().map_err(|e| MacToolsError::HotKey {
            shortcut: String::new(),
            message: describe_error(&e),
        })?;
        Ok(Self {
            manager: Arc::new(Mutex::new(Manager(manager))),
            handlers: Arc::new(Mutex::new(HashMap::new())),
            listener: Once::new(),
        })
    }

    /// Forward presses from the hot-key channel to the main queue
    fn start_listener(&self) {
        let handlers = self.handlers.clone();
        self.listener.call_once(move || {
            let spawned = std::thread::Builder::new()
                .name("mactools-hotkeys".to_string())
                .spawn(move || {
                    let receiver = GlobalHotKeyEvent::receiver();
                    while let Ok(event) = receiver.recv() {
                        if event.state != HotKeyState::Pressed {
                            continue;
                        }
                        let handler = handlers.lock().get(&event.id).cloned();
                        match handler {
                            Some(handler) => {
                                debug!(id = event.id, "Hot key pressed");
                                GcdExecutor.dispatch(Box::new(move || handler()));
                            }
                            None => debug!(id = event.id, "Hot key without handler"),
                        }
                    }
                });
            if let Err(e) = spawned {
                warn!(error = %e, "Failed to start hot key listener");
            }
        });
    }
}

impl HotKeys for MacHotKeys {
    fn register(
        &self,
        binding: &ShortcutBinding,
        on_press: HotKeyCallback,
    ) -> Result<Box<dyn RegisteredHotKey>> {
        ensure_main_thread("hot key register");
        let hotkey = to_hotkey(binding).ok_or_else(|| MacToolsError::HotKey {
            shortcut: binding.display(),
            message: "key has no hot-key equivalent".to_string(),
        })?;

        self.manager
            .lock()
            .0
            .register(hotkey)
            .map_err(|e| MacToolsError::HotKey {
                shortcut: binding.display(),
                message: describe_error(&e),
            })?;
        self.handlers.lock().insert(hotkey.id(), on_press);
        self.start_listener();

        info!(shortcut = %binding, id = hotkey.id(), "Registered hot key");
        Ok(Box::new(MacRegisteredHotKey {
            hotkey: Some(hotkey),
            manager: self.manager.clone(),
            handlers: self.handlers.clone(),
        }))
    }
}

struct MacRegisteredHotKey {
    hotkey: Option<HotKey>,
    manager: Arc<Mutex<Manager>>,
    handlers: Handlers,
}

impl RegisteredHotKey for MacRegisteredHotKey {
    fn unregister(&mut self) {
        let Some(hotkey) = self.hotkey.take() else {
            return;
        };
        self.handlers.lock().remove(&hotkey.id());
        if let Err(e) = self.manager.lock().0.unregister(hotkey) {
            warn!(id = hotkey.id(), error = %describe_error(&e), "Hot key unregister failed");
        } else {
            info!(id = hotkey.id(), "Unregistered hot key");
        }
    }
}

impl Drop for MacRegisteredHotKey {
    fn drop(&mut self) {
        self.unregister();
    }
}
