//! Window mutation: move and resize a window picked from the inventory.
//!
//! Inventory ids come from the window server, not the Accessibility API, so
//! the record is re-resolved to a live AX window first. The stable window id
//! behind each AX window is tried before falling back to geometry matching.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, instrument};

use crate::config::{MatchingConfig, SettingsStore};
use crate::diagnostics::Diagnostics;
use crate::error::ResultExt;
use crate::executor::{Executor, TimerGroup};
use crate::geometry::{Point, Rect, Size};
use crate::inventory::WindowRecord;
use crate::platform::{Accessibility, CoordinateSpace, Element, Workspace};

const SOURCE: &str = "mutation";

/// Record bounds expressed in the AX (top-left) space.
pub fn record_bounds_top_left(record: &WindowRecord, screen_height: f64) -> Rect {
    match record.space {
        CoordinateSpace::TopLeft => record.bounds,
        CoordinateSpace::BottomLeft => record.bounds.flipped(screen_height),
    }
}

/// Geometry rule for re-identifying a window: position and size roughly
/// match, or the size alone matches closely.
pub fn geometry_matches(candidate: &Rect, recorded: &Rect, tol: &MatchingConfig) -> bool {
    let position_and_size = candidate
        .origin
        .approx_eq(&recorded.origin, tol.position_tolerance)
        && candidate.size.approx_eq(&recorded.size, tol.size_tolerance);
    position_and_size || candidate.size.approx_eq(&recorded.size, tol.size_only_tolerance)
}

#[derive(Clone)]
pub struct WindowMutator {
    accessibility: Arc<dyn Accessibility>,
    workspace: Arc<dyn Workspace>,
    executor: Arc<dyn Executor>,
    settings: Arc<Mutex<SettingsStore>>,
    diagnostics: Diagnostics,
}

impl WindowMutator {
    pub fn new(
        accessibility: Arc<dyn Accessibility>,
        workspace: Arc<dyn Workspace>,
        executor: Arc<dyn Executor>,
        settings: Arc<Mutex<SettingsStore>>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            accessibility,
            workspace,
            executor,
            settings,
            diagnostics,
        }
    }

    /// Find the live AX window behind `record` among its process's windows.
    pub fn resolve(&self, record: &WindowRecord) -> Option<Element> {
        let candidates = self.accessibility.windows(record.pid);

        if let Some(found) = candidates
            .iter()
            .find(|w| self.accessibility.window_id(w) == Some(record.id))
        {
            debug!(window_id = record.id, "Matched by window id");
            return Some(found.clone());
        }

        let screen_height = self
            .workspace
            .main_screen()
            .map(|s| s.height())
            .unwrap_or_default();
        let recorded = record_bounds_top_left(record, screen_height);
        let tolerances = self.settings.lock().get().matching.clone();

        let found = candidates.into_iter().find(|w| {
            self.accessibility
                .frame(w)
                .is_some_and(|frame| geometry_matches(&frame, &recorded, &tolerances))
        });
        if found.is_some() {
            debug!(window_id = record.id, "Matched by geometry");
        }
        found
    }

    /// Origin the window keeps after resizing: its recorded origin, pulled
    /// back so the new size fits on the main screen.
    pub fn target_origin(&self, record: &WindowRecord, size: Size) -> Point {
        let screen = self.workspace.main_screen();
        let screen_height = screen.map(|s| s.height()).unwrap_or_default();
        let origin = record_bounds_top_left(record, screen_height).origin;
        match screen {
            Some(screen) => Rect::clamp_origin(origin, size, &screen),
            None => origin,
        }
    }

    /// Activate the owner, re-resolve the window, move it, then resize it
    /// after a settle delay. A window that can't be resolved is left alone.
    ///
    /// Delayed steps are tracked in `timers` so the caller can cancel them.
    #[instrument(skip(self, record, timers), fields(window_id = record.id, pid = record.pid))]
    pub fn reposition(&self, record: WindowRecord, size: Size, timers: &Arc<TimerGroup>) {
        let timing = self.settings.lock().get().timing.clone();
        self.workspace.activate(record.pid);

        let this = self.clone();
        let group = timers.clone();
        let timer = self.executor.dispatch_after(
            Duration::from_millis(timing.activation_settle_ms),
            Box::new(move || {
                let Some(window) = this.resolve(&record) else {
                    this.diagnostics.miss(
                        SOURCE,
                        format!("no live window matches '{}'", record.name),
                    );
                    return;
                };
                let origin = this.target_origin(&record, size);
                this.accessibility.set_position(&window, origin).log_err();

                let ax = this.accessibility.clone();
                let settle = this.executor.dispatch_after(
                    Duration::from_millis(timing.move_resize_settle_ms),
                    Box::new(move || {
                        if ax.set_size(&window, size).log_err().is_some() {
                            info!(width = size.width, height = size.height, "Window resized");
                        }
                    }),
                );
                group.track(settle);
            }),
        );
        timers.track(timer);
    }
}
