//! Resize trigger: shortcut -> window picker -> size picker -> mutation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{Feature, FeatureController, Services};
use crate::error::Result;
use crate::event_monitor::EventTapHandle;
use crate::executor::TimerGroup;
use crate::geometry::Size;
use crate::platform::{EventMask, InputEvent, TapDisposition};
use crate::shortcuts::ShortcutBinding;

const SOURCE: &str = "resize_trigger";

pub struct ResizeTrigger {
    services: Services,
    tap: Option<EventTapHandle>,
    timers: Arc<TimerGroup>,
    session_open: Arc<AtomicBool>,
}

/// Clears the session flag however the session ends
struct SessionGuard(Arc<AtomicBool>);

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ResizeTrigger {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            tap: None,
            timers: Arc::new(TimerGroup::new()),
            session_open: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run the picker flow now, as if the shortcut had been pressed.
    pub fn trigger(&self) {
        open_session(&self.services, &self.timers, &self.session_open);
    }
}

/// Tap callback body. Runs on the tap's run loop and must return quickly.
fn on_key_down(
    services: &Services,
    timers: &Arc<TimerGroup>,
    session_open: &Arc<AtomicBool>,
    binding: ShortcutBinding,
    key_code: u16,
    flags: u64,
) -> TapDisposition {
    if !services.is_enabled(Feature::ResizeTrigger) {
        return TapDisposition::PassThrough;
    }
    if !binding.matches(key_code, flags) {
        return TapDisposition::PassThrough;
    }
    debug!(shortcut = %binding, "Resize shortcut pressed");
    let s = services.clone();
    let t = timers.clone();
    let open = session_open.clone();
    let task = timers.bind(Box::new(move || open_session(&s, &t, &open)));
    services.platform.executor.dispatch(task);
    TapDisposition::Consume
}

fn open_session(services: &Services, timers: &Arc<TimerGroup>, session_open: &Arc<AtomicBool>) {
    if session_open.swap(true, Ordering::SeqCst) {
        debug!("Picker already open");
        return;
    }
    let guard = SessionGuard(session_open.clone());
    if !services.require_trust(SOURCE) {
        return;
    }

    let s = services.clone();
    let t = timers.clone();
    let token = timers.token();
    services.platform.executor.spawn_background(Box::new(move || {
        let _guard = guard;

        let records = s.inventory.enumerate(true);
        if records.is_empty() {
            s.diagnostics.miss(SOURCE, "no windows to offer");
            return;
        }
        let Some(index) = s.platform.picker.pick_window(&records) else {
            debug!("Window picker cancelled");
            return;
        };
        let Some(record) = records.get(index).cloned() else {
            warn!(index, count = records.len(), "Picker returned an invalid index");
            return;
        };

        let sizes = s.settings.lock().get().preset_window_sizes.clone();
        let Some(preset) = s.platform.picker.pick_size(&record, &sizes) else {
            debug!("Size picker cancelled");
            return;
        };
        info!(window = %record.name, size = %preset.label(), "Resizing window");

        let size = Size::new(preset.width as f64, preset.height as f64);
        if token.is_cancelled() {
            debug!("Resize trigger stopped while the picker was open");
            return;
        }
        let mutator = s.mutator.clone();
        let task = token.bind(Box::new(move || mutator.reposition(record, size, &t)));
        s.platform.executor.dispatch(task);
    }));
}

impl FeatureController for ResizeTrigger {
    fn feature(&self) -> Feature {
        Feature::ResizeTrigger
    }

    fn start(&mut self) -> Result<()> {
        if self.tap.is_some() {
            return Ok(());
        }
        let binding = self.services.settings.lock().get().window_resizer_shortcut;
        let services = self.services.clone();
        let timers = self.timers.clone();
        let session_open = self.session_open.clone();

        let handle = self.services.monitor.install(
            SOURCE,
            EventMask::KEY_DOWN,
            Box::new(move |event| match *event {
                InputEvent::KeyDown { key_code, flags } => {
                    on_key_down(&services, &timers, &session_open, binding, key_code, flags)
                }
                _ => TapDisposition::PassThrough,
            }),
        )?;
        self.tap = Some(handle);
        info!(feature = SOURCE, shortcut = %binding, "Feature started");
        Ok(())
    }

    fn stop(&mut self) {
        let cancelled = self.timers.cancel_all();
        if let Some(mut tap) = self.tap.take() {
            tap.uninstall();
            info!(feature = SOURCE, cancelled, "Feature stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.tap.is_some()
    }
}

impl Drop for ResizeTrigger {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "resize_trigger_tests.rs"]
mod tests;
