//! Dock-click minimizer.
//!
//! Clicking the Dock tile of the app that is already frontmost minimizes its
//! focused window, unless the click opened a new window. The window count is
//! re-checked after a short delay to tell the two apart.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::{Feature, FeatureController, Services};
use crate::error::{Result, ResultExt};
use crate::event_monitor::EventTapHandle;
use crate::executor::TimerGroup;
use crate::geometry::Point;
use crate::platform::{EventMask, InputEvent, Pid, TapDisposition};

const DOCK_BUNDLE_ID: &str = "com.apple.dock";
const SOURCE: &str = "dock_minimizer";

pub struct DockMinimizer {
    services: Services,
    tap: Option<EventTapHandle>,
    timers: Arc<TimerGroup>,
}

impl DockMinimizer {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            tap: None,
            timers: Arc::new(TimerGroup::new()),
        }
    }
}

/// Non-minimized windows of `pid`
fn visible_window_count(services: &Services, pid: Pid) -> usize {
    let ax = &services.platform.accessibility;
    ax.windows(pid)
        .iter()
        .filter(|w| ax.is_minimized(w) == Some(false))
        .count()
}

fn handle_click(services: &Services, timers: &Arc<TimerGroup>, location: Point) {
    if !services.is_enabled(Feature::DockMinimizer) {
        return;
    }
    if !services.require_trust(SOURCE) {
        return;
    }

    let Some(clicked) = services.resolver.owner_at(location) else {
        return;
    };
    let workspace = &services.platform.workspace;
    let Some(front) = workspace.frontmost_app() else {
        return;
    };
    let Some(front_bundle) = front.bundle_id.as_deref() else {
        return;
    };
    let host_bundle = workspace.host().bundle_id;
    if host_bundle.as_deref() == Some(front_bundle)
        || front_bundle == DOCK_BUNDLE_ID
        || clicked.as_str() != front_bundle
    {
        debug!(clicked = clicked.as_str(), front = front_bundle, "Click not on frontmost app's tile");
        return;
    }

    let pid = front.pid;
    let before = visible_window_count(services, pid);
    if before == 0 {
        return;
    }

    let delay = Duration::from_millis(services.settings.lock().get().timing.dock_recheck_delay_ms);
    let s = services.clone();
    let timer = services.platform.executor.dispatch_after(
        delay,
        Box::new(move || recheck(&s, pid, before)),
    );
    timers.track(timer);
}

fn recheck(services: &Services, pid: Pid, before: usize) {
    let still_front = services
        .platform
        .workspace
        .frontmost_app()
        .is_some_and(|app| app.pid == pid);
    let after = visible_window_count(services, pid);
    if !still_front || after > before {
        debug!(pid, before, after, still_front, "Dock click opened or switched, not minimizing");
        return;
    }
    let Some(window) = services.resolver.focused_window(pid) else {
        return;
    };
    if services
        .platform
        .accessibility
        .minimize(&window)
        .log_err()
        .is_some()
    {
        info!(pid, "Minimized focused window after Dock click");
    }
}

impl FeatureController for DockMinimizer {
    fn feature(&self) -> Feature {
        Feature::DockMinimizer
    }

    fn start(&mut self) -> Result<()> {
        if self.tap.is_some() {
            return Ok(());
        }
        let services = self.services.clone();
        let timers = self.timers.clone();
        let handle = self.services.monitor.install(
            SOURCE,
            EventMask::LEFT_MOUSE_DOWN,
            Box::new(move |event| {
                if let InputEvent::LeftMouseDown { location } = *event {
                    let s = services.clone();
                    let t = timers.clone();
                    let task = timers.bind(Box::new(move || handle_click(&s, &t, location)));
                    services.platform.executor.dispatch(task);
                }
                TapDisposition::PassThrough
            }),
        )?;
        self.tap = Some(handle);
        info!(feature = SOURCE, "Feature started");
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

impl Drop for DockMinimizer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "dock_minimizer_tests.rs"]
mod tests;
