//! Element resolution: screen points and focus back to apps and windows.
//!
//! Dock tiles don't carry an application identity of their own. The owner of
//! a point is found by walking up from the hit-tested element until one of
//! its ancestors exposes a bundle URL, or a title that names a running app.

use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::diagnostics::Diagnostics;
use crate::geometry::Point;
use crate::platform::{Accessibility, Element, Pid, Workspace};

const SOURCE: &str = "resolution";

/// The Trash tile has no URL; it belongs to Finder.
const TRASH_TITLES: &[&str] = &["Trash", "废纸篓"];
pub const FINDER_BUNDLE_ID: &str = "com.apple.finder";

/// Guard against cyclic parent chains
const MAX_ANCESTOR_DEPTH: usize = 32;

/// Bundle identity of an application
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApplicationIdentity(pub String);

impl ApplicationIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone)]
pub struct ElementResolver {
    accessibility: Arc<dyn Accessibility>,
    workspace: Arc<dyn Workspace>,
    diagnostics: Diagnostics,
}

impl ElementResolver {
    pub fn new(
        accessibility: Arc<dyn Accessibility>,
        workspace: Arc<dyn Workspace>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            accessibility,
            workspace,
            diagnostics,
        }
    }

    /// Application owning the UI element under `point` (top-left origin).
    #[instrument(level = "debug", skip(self))]
    pub fn owner_at(&self, point: Point) -> Option<ApplicationIdentity> {
        let hit = match self.accessibility.element_at(point) {
            Ok(Some(element)) => element,
            Ok(None) => {
                self.diagnostics.miss(SOURCE, format!("no element at {:?}", point));
                return None;
            }
            Err(e) => {
                self.diagnostics.record_error(SOURCE, &e);
                return None;
            }
        };

        let mut current = Some(hit);
        let mut depth = 0;
        while let Some(element) = current {
            if depth >= MAX_ANCESTOR_DEPTH {
                break;
            }
            if let Some(identity) = self.identity_of(&element) {
                debug!(bundle_id = identity.as_str(), depth, "Resolved owner");
                return Some(identity);
            }
            current = self.accessibility.parent(&element);
            depth += 1;
        }

        self.diagnostics
            .miss(SOURCE, format!("no owning app for element at {:?}", point));
        None
    }

    fn identity_of(&self, element: &Element) -> Option<ApplicationIdentity> {
        if let Some(url) = self.accessibility.url(element) {
            trace!(%url, "Element has URL");
            if let Some(bundle_id) = self.workspace.bundle_id_for_url(&url) {
                return Some(ApplicationIdentity(bundle_id));
            }
        }

        let title = self.accessibility.title(element)?;
        if title.is_empty() {
            return None;
        }
        if TRASH_TITLES.contains(&title.as_str()) {
            return Some(ApplicationIdentity(FINDER_BUNDLE_ID.to_string()));
        }
        self.workspace
            .running_apps()
            .into_iter()
            .find(|app| app.name.as_deref() == Some(title.as_str()))
            .and_then(|app| app.bundle_id)
            .map(ApplicationIdentity)
    }

    /// Focused window of the application `pid`.
    pub fn focused_window(&self, pid: Pid) -> Option<Element> {
        let window = self.accessibility.focused_window(pid);
        if window.is_none() {
            self.diagnostics
                .miss(SOURCE, format!("no focused window for pid {}", pid));
        }
        window
    }
}
