//! Window inventory: the user-facing windows the resize picker offers.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, instrument};

use crate::config::{InventoryConfig, SettingsStore};
use crate::diagnostics::Diagnostics;
use crate::geometry::Rect;
use crate::platform::{
    CoordinateSpace, Pid, RawWindow, Thumbnail, ThumbnailSource, WindowId, WindowServer, Workspace,
};

const SOURCE: &str = "inventory";
const ICON_SIZE: u32 = 128;

/// Snapshot of one window taken at enumeration time.
///
/// `id` doubles as the handle for re-requesting a thumbnail; it is never used
/// to mutate the window directly.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowRecord {
    pub id: WindowId,
    /// `Owner - Title`
    pub name: String,
    pub owner_name: String,
    pub pid: Pid,
    pub bounds: Rect,
    pub space: CoordinateSpace,
    pub thumbnail: Option<Thumbnail>,
}

/// Whether `window` passes every inventory filter except per-process dedup.
fn is_user_facing(window: &RawWindow, host_pid: Pid, config: &InventoryConfig) -> bool {
    if window.owner_pid == host_pid {
        return false;
    }
    if let Some(bundle_id) = window.owner_bundle_id.as_deref() {
        if config.excluded_bundle_ids.iter().any(|b| b == bundle_id) {
            return false;
        }
    }
    if window.bounds.width() <= config.min_window_width
        || window.bounds.height() <= config.min_window_height
    {
        return false;
    }
    window.on_screen && window.layer == 0 && !window.title.is_empty()
}

/// Apply the filters in order and keep the first window per process.
pub fn filter_windows(
    windows: Vec<RawWindow>,
    host_pid: Pid,
    config: &InventoryConfig,
) -> Vec<RawWindow> {
    let mut seen = HashSet::new();
    windows
        .into_iter()
        .filter(|w| is_user_facing(w, host_pid, config))
        .filter(|w| seen.insert(w.owner_pid))
        .collect()
}

#[derive(Clone)]
pub struct WindowInventory {
    window_server: Arc<dyn WindowServer>,
    workspace: Arc<dyn Workspace>,
    settings: Arc<Mutex<SettingsStore>>,
    diagnostics: Diagnostics,
}

impl WindowInventory {
    pub fn new(
        window_server: Arc<dyn WindowServer>,
        workspace: Arc<dyn Workspace>,
        settings: Arc<Mutex<SettingsStore>>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            window_server,
            workspace,
            settings,
            diagnostics,
        }
    }

    /// Enumerate user-facing windows, at most one per process.
    ///
    /// Returns an empty list when the window server is unavailable or
    /// permission is missing. A failed capture falls back to the app icon and
    /// never fails the enumeration.
    #[instrument(name = "enumerate_windows", skip(self))]
    pub fn enumerate(&self, with_thumbnails: bool) -> Vec<WindowRecord> {
        let config = self.settings.lock().get().inventory.clone();

        let raw = match self.window_server.on_screen_windows() {
            Ok(raw) => raw,
            Err(e) => {
                self.diagnostics.record_error(SOURCE, &e);
                return Vec::new();
            }
        };
        let total = raw.len();
        let host_pid = self.workspace.host().pid;
        let kept = filter_windows(raw, host_pid, &config);

        let records: Vec<WindowRecord> = kept
            .into_iter()
            .map(|w| {
                let thumbnail = if with_thumbnails {
                    self.thumbnail_for(&w, config.thumbnail_width)
                } else {
                    None
                };
                WindowRecord {
                    id: w.id,
                    name: format!("{} - {}", w.owner_name, w.title),
                    owner_name: w.owner_name,
                    pid: w.owner_pid,
                    bounds: w.bounds,
                    space: w.space,
                    thumbnail,
                }
            })
            .collect();

        info!(total, kept = records.len(), "Window inventory enumerated");
        records
    }

    fn thumbnail_for(&self, window: &RawWindow, width: u32) -> Option<Thumbnail> {
        match self.window_server.capture_thumbnail(window.id, width) {
            Ok(thumbnail) => Some(thumbnail),
            Err(e) => {
                debug!(window_id = window.id, error = %e, "Capture failed, using app icon");
                self.diagnostics.record_error(SOURCE, &e);
                self.workspace
                    .app_icon_png(window.owner_pid, ICON_SIZE)
                    .map(|png| Thumbnail {
                        width: ICON_SIZE,
                        height: ICON_SIZE,
                        png,
                        source: ThumbnailSource::AppIcon,
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::testing::{raw_window, Fakes};

    fn inventory(fakes: &Fakes) -> WindowInventory {
        let settings = SettingsStore::with_settings(
            std::env::temp_dir().join("mactools-inventory-unused.json"),
            Settings::default(),
        );
        WindowInventory::new(
            fakes.window_server.clone(),
            fakes.workspace.clone(),
            Arc::new(Mutex::new(settings)),
            Diagnostics::new(),
        )
    }

    fn big() -> Rect {
        Rect::new(100.0, 100.0, 800.0, 600.0)
    }

    #[test]
    fn test_filters_in_order() {
        let fakes = Fakes::new();
        let host = fakes.workspace.state.lock().host.pid;
        let mut offscreen = raw_window(5, 50, "com.example.five", "Hidden", big());
        offscreen.on_screen = false;
        let mut overlay = raw_window(7, 70, "com.example.seven", "HUD", big());
        overlay.layer = 25;
        fakes.window_server.state.lock().windows = vec![
            raw_window(1, host, "com.mactools.app", "Settings", big()),
            raw_window(2, 20, "com.apple.dock", "Dock", big()),
            raw_window(3, 30, "com.example.three", "Tiny", Rect::new(0.0, 0.0, 100.0, 400.0)),
            raw_window(4, 40, "com.example.four", "", big()),
            offscreen,
            raw_window(6, 60, "com.example.six", "Document", big()),
            overlay,
        ];

        let records = inventory(&fakes).enumerate(false);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 6);
        assert_eq!(records[0].name, "six - Document");
    }

    #[test]
    fn test_one_record_per_process_first_wins() {
        let fakes = Fakes::new();
        fakes.window_server.state.lock().windows = vec![
            raw_window(10, 42, "com.example.editor", "First", big()),
            raw_window(11, 42, "com.example.editor", "Second", big()),
            raw_window(12, 43, "com.example.other", "Other", big()),
        ];
        let records = inventory(&fakes).enumerate(false);
        let pids: Vec<Pid> = records.iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![42, 43]);
        assert_eq!(records[0].id, 10);
    }

    #[test]
    fn test_small_windows_never_appear() {
        let fakes = Fakes::new();
        fakes.window_server.state.lock().windows = (0..20)
            .map(|i| {
                let side = 90.0 + i as f64;
                raw_window(i, i as Pid + 100, "com.example.app", "W", Rect::new(0.0, 0.0, side, 500.0))
            })
            .collect();
        let records = inventory(&fakes).enumerate(false);
        assert!(records.iter().all(|r| r.bounds.width() > 100.0));
        assert_eq!(records.len(), 9);
    }

    #[test]
    fn test_unavailable_service_yields_empty() {
        let fakes = Fakes::new();
        fakes.window_server.state.lock().unavailable = true;
        assert!(inventory(&fakes).enumerate(true).is_empty());
    }

    #[test]
    fn test_capture_failure_falls_back_to_icon() {
        let fakes = Fakes::new();
        {
            let mut ws = fakes.window_server.state.lock();
            ws.windows = vec![
                raw_window(1, 10, "com.example.a", "A", big()),
                raw_window(2, 20, "com.example.b", "B", big()),
                raw_window(3, 30, "com.example.c", "C", big()),
            ];
            ws.capture_fails.insert(2);
            ws.capture_fails.insert(3);
        }
        fakes.workspace.state.lock().icons.insert(20, vec![1, 2, 3]);

        let records = inventory(&fakes).enumerate(true);
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0].thumbnail.as_ref().map(|t| t.source),
            Some(ThumbnailSource::Capture)
        );
        assert_eq!(records[0].thumbnail.as_ref().map(|t| t.width), Some(400));
        assert_eq!(
            records[1].thumbnail.as_ref().map(|t| t.source),
            Some(ThumbnailSource::AppIcon)
        );
        assert!(records[2].thumbnail.is_none());
    }

    #[test]
    fn test_no_thumbnails_skips_capture() {
        let fakes = Fakes::new();
        fakes.window_server.state.lock().windows =
            vec![raw_window(1, 10, "com.example.a", "A", big())];
        inventory(&fakes).enumerate(false);
        assert!(fakes.window_server.state.lock().captures.is_empty());
    }
}
