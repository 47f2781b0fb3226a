//! The set of windows pinned above normal windows.
//!
//! Lives for the process lifetime; nothing here is persisted.

use std::collections::BTreeSet;

use crate::platform::WindowId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinnedWindowSet {
    ids: BTreeSet<WindowId>,
}

impl PinnedWindowSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `id`; returns true when the window is now pinned.
    pub fn toggle(&mut self, id: WindowId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> Vec<WindowId> {
        self.ids.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
