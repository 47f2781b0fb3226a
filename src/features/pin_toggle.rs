//! Pin toggle: keep the frontmost window above normal windows.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::{Feature, FeatureController, Services};
use crate::error::{Result, ResultExt};
use crate::executor::TimerGroup;
use crate::hotkey::HotKeyHandle;
use crate::platform::{Pid, WindowId, WindowLevel};

const SOURCE: &str = "pin_toggle";

pub struct PinToggle {
    services: Services,
    hot_key: Option<HotKeyHandle>,
    timers: Arc<TimerGroup>,
    running: bool,
}

impl PinToggle {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            hot_key: None,
            timers: Arc::new(TimerGroup::new()),
            running: false,
        }
    }

    /// Toggle the frontmost window now, as if the hot key had been pressed.
    pub fn toggle_front_window(&self) -> Option<(WindowId, bool)> {
        toggle_front_window(&self.services, &self.timers)
    }
}

/// Window-server id of the first on-screen window owned by `pid`
fn first_window_of(services: &Services, pid: Pid) -> Option<WindowId> {
    services
        .platform
        .window_server
        .on_screen_windows()
        .warn_on_err()?
        .into_iter()
        .find(|w| w.owner_pid == pid)
        .map(|w| w.id)
}

/// Returns the toggled window id and whether it is now pinned.
fn toggle_front_window(services: &Services, timers: &Arc<TimerGroup>) -> Option<(WindowId, bool)> {
    if !services.require_trust(SOURCE) {
        return None;
    }
    let Some(front) = services.platform.workspace.frontmost_app() else {
        services.diagnostics.miss(SOURCE, "no frontmost application");
        return None;
    };
    let window = services.resolver.focused_window(front.pid)?;
    let ax = &services.platform.accessibility;
    let pid = ax.pid(&window).unwrap_or(front.pid);

    let Some(id) = ax.window_id(&window).or_else(|| first_window_of(services, pid)) else {
        services
            .diagnostics
            .miss(SOURCE, format!("no window id for pid {}", pid));
        return None;
    };

    let pinned = services.pinned.lock().toggle(id);
    let level = if pinned {
        WindowLevel::Floating
    } else {
        WindowLevel::Normal
    };
    if let Err(e) = services.platform.window_server.set_level(id, level) {
        warn!(window_id = id, ?level, error = %e, "Window level change refused");
        services.diagnostics.record_error(SOURCE, &e);
    }

    // the level change can steal focus from the target app
    services.platform.workspace.activate(pid);
    let delay = Duration::from_millis(
        services
            .settings
            .lock()
            .get()
            .timing
            .focus_restore_delay_ms,
    );
    let workspace = services.platform.workspace.clone();
    let timer = services.platform.executor.dispatch_after(
        delay,
        Box::new(move || {
            workspace.restore_focus(pid).log_err();
        }),
    );
    timers.track(timer);

    info!(window_id = id, pid, pinned, "Pin toggled");
    Some((id, pinned))
}

impl FeatureController for PinToggle {
    fn feature(&self) -> Feature {
        Feature::PinToggle
    }

    fn start(&mut self) -> Result<()> {
        if self.running {
            return Ok(());
        }
        let binding = self.services.settings.lock().get().window_pin_shortcut;
        let services = self.services.clone();
        let timers = self.timers.clone();
        self.hot_key = self.services.hot_keys.register(
            SOURCE,
            binding,
            Arc::new(move || {
                let s = services.clone();
                let t = timers.clone();
                let task = timers.bind(Box::new(move || {
                    toggle_front_window(&s, &t);
                }));
                services.platform.executor.dispatch(task);
            }),
        )?;
        self.running = true;
        info!(feature = SOURCE, shortcut = %binding, "Feature started");
        Ok(())
    }

    fn stop(&mut self) {
        let cancelled = self.timers.cancel_all();
        self.hot_key = None;
        if self.running {
            self.running = false;
            info!(feature = SOURCE, cancelled, "Feature stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

impl Drop for PinToggle {
    fn drop(&mut self) {
        self.stop();
    }
}
