//! Global event monitor.
//!
//! Wraps the platform's low-level input tap in an [`EventTapHandle`] that owns
//! the native resource. Dropping the handle disables the tap and detaches it
//! from the run loop, so a controller can never leak a tap by forgetting to
//! clean up.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::diagnostics::Diagnostics;
use crate::error::{MacToolsError, Result};
use crate::platform::{EventMask, InputTaps, InstalledTap, TapCallback};

/// One active low-level interception
pub struct EventTapHandle {
    feature: &'static str,
    tap: Option<Box<dyn InstalledTap>>,
    enabled: bool,
}

impl EventTapHandle {
    pub fn enable(&mut self) {
        if let Some(tap) = self.tap.as_mut() {
            tap.set_enabled(true);
            self.enabled = true;
        }
    }

    pub fn disable(&mut self) {
        if let Some(tap) = self.tap.as_mut() {
            tap.set_enabled(false);
            self.enabled = false;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_installed(&self) -> bool {
        self.tap.is_some()
    }

    /// Disable and detach. Safe to call more than once.
    pub fn uninstall(&mut self) {
        if let Some(mut tap) = self.tap.take() {
            tap.set_enabled(false);
            tap.uninstall();
            self.enabled = false;
            debug!(feature = self.feature, "Event tap uninstalled");
        }
    }
}

impl Drop for EventTapHandle {
    fn drop(&mut self) {
        self.uninstall();
    }
}

impl std::fmt::Debug for EventTapHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTapHandle")
            .field("feature", &self.feature)
            .field("installed", &self.tap.is_some())
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[derive(Clone)]
pub struct GlobalEventMonitor {
    taps: Arc<dyn InputTaps>,
    diagnostics: Diagnostics,
}

impl GlobalEventMonitor {
    pub fn new(taps: Arc<dyn InputTaps>, diagnostics: Diagnostics) -> Self {
        Self { taps, diagnostics }
    }

    /// Install and enable a tap for `mask`.
    ///
    /// A refused tap is reported as `MacToolsError::EventTap` and recorded in
    /// diagnostics; callers stay stopped and may retry later.
    pub fn install(
        &self,
        feature: &'static str,
        mask: EventMask,
        callback: TapCallback,
    ) -> Result<EventTapHandle> {
        match self.taps.install(mask, callback) {
            Ok(tap) => {
                let mut handle = EventTapHandle {
                    feature,
                    tap: Some(tap),
                    enabled: false,
                };
                handle.enable();
                info!(feature, ?mask, "Event tap installed");
                Ok(handle)
            }
            Err(e) => {
                warn!(feature, error = %e, "Event tap creation refused");
                let err = MacToolsError::EventTap { feature };
                self.diagnostics.record_error(feature, &err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::geometry::Point;
    use crate::platform::{InputEvent, TapDisposition};
    use crate::testing::FakeInputTaps;
    use std::sync::atomic::Ordering;

    fn monitor(taps: &Arc<FakeInputTaps>) -> (GlobalEventMonitor, Diagnostics) {
        let diagnostics = Diagnostics::new();
        (GlobalEventMonitor::new(taps.clone(), diagnostics.clone()), diagnostics)
    }

    fn click() -> InputEvent {
        InputEvent::LeftMouseDown {
            location: Point::new(10.0, 10.0),
        }
    }

    #[test]
    fn test_install_enables_and_delivers() {
        let taps = Arc::new(FakeInputTaps::default());
        let (monitor, _) = monitor(&taps);
        let handle = monitor
            .install(
                "test",
                EventMask::LEFT_MOUSE_DOWN,
                Box::new(|_| TapDisposition::PassThrough),
            )
            .unwrap();
        assert!(handle.is_enabled());
        assert_eq!(taps.fire(click()), vec![TapDisposition::PassThrough]);
    }

    #[test]
    fn test_mask_filters_events() {
        let taps = Arc::new(FakeInputTaps::default());
        let (monitor, _) = monitor(&taps);
        let _handle = monitor
            .install("test", EventMask::KEY_DOWN, Box::new(|_| TapDisposition::Consume))
            .unwrap();
        assert!(taps.fire(click()).is_empty());
    }

    #[test]
    fn test_drop_uninstalls() {
        let taps = Arc::new(FakeInputTaps::default());
        let (monitor, _) = monitor(&taps);
        let handle = monitor
            .install(
                "test",
                EventMask::LEFT_MOUSE_DOWN,
                Box::new(|_| TapDisposition::PassThrough),
            )
            .unwrap();
        assert_eq!(taps.live_count(), 1);
        drop(handle);
        assert_eq!(taps.live_count(), 0);
        assert!(taps.fire(click()).is_empty());
    }

    #[test]
    fn test_disabled_tap_is_inert() {
        let taps = Arc::new(FakeInputTaps::default());
        let (monitor, _) = monitor(&taps);
        let mut handle = monitor
            .install(
                "test",
                EventMask::LEFT_MOUSE_DOWN,
                Box::new(|_| TapDisposition::PassThrough),
            )
            .unwrap();
        handle.disable();
        assert!(taps.fire(click()).is_empty());
        assert_eq!(taps.live_count(), 1);
    }

    #[test]
    fn test_refusal_is_reported() {
        let taps = Arc::new(FakeInputTaps::default());
        taps.deny.store(true, Ordering::SeqCst);
        let (monitor, diagnostics) = monitor(&taps);
        let err = monitor
            .install(
                "dock_minimizer",
                EventMask::LEFT_MOUSE_DOWN,
                Box::new(|_| TapDisposition::PassThrough),
            )
            .unwrap_err();
        assert!(matches!(err, MacToolsError::EventTap { feature: "dock_minimizer" }));
        assert_eq!(diagnostics.count(ErrorKind::ResourceExhaustion), 1);
    }
}
