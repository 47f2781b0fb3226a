//! Preset window sizes offered by the size picker.
//!
//! The list lives in [`Settings::preset_window_sizes`](crate::config::Settings)
//! and every mutation here is written through to the settings file.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::config::{default_preset_sizes, PresetSize, SettingsStore};
use crate::error::{MacToolsError, Result};

#[derive(Clone)]
pub struct PresetStore {
    settings: Arc<Mutex<SettingsStore>>,
}

fn validate(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(MacToolsError::Config(format!(
            "preset size {}×{} must be larger than zero",
            width, height
        )));
    }
    Ok(())
}

/// Move the items at `indices` so they land before `to`, keeping their
/// relative order. `to` is an offset into the list as it was before the move.
pub fn move_items<T>(items: &mut Vec<T>, indices: &BTreeSet<usize>, to: usize) {
    let to = to.min(items.len());
    let mut moved = Vec::with_capacity(indices.len());
    let mut kept = Vec::with_capacity(items.len());
    for (i, item) in items.drain(..).enumerate() {
        if indices.contains(&i) {
            moved.push(item);
        } else {
            kept.push(item);
        }
    }
    let shift = indices.iter().filter(|&&i| i < to).count();
    let insert_at = (to - shift).min(kept.len());
    let tail = kept.split_off(insert_at);
    kept.extend(moved);
    kept.extend(tail);
    *items = kept;
}

impl PresetStore {
    pub fn new(settings: Arc<Mutex<SettingsStore>>) -> Self {
        Self { settings }
    }

    pub fn list(&self) -> Vec<PresetSize> {
        self.settings.lock().get().preset_window_sizes.clone()
    }

    /// Append a size with a fresh id and return it.
    pub fn add(&self, width: u32, height: u32) -> Result<PresetSize> {
        validate(width, height)?;
        let preset = PresetSize::new(width, height);
        self.settings
            .lock()
            .update(|s| s.preset_window_sizes.push(preset))?;
        info!(id = %preset.id, width, height, "Preset added");
        Ok(preset)
    }

    pub fn delete(&self, index: usize) -> Result<PresetSize> {
        let mut store = self.settings.lock();
        let len = store.get().preset_window_sizes.len();
        if index >= len {
            return Err(MacToolsError::Config(format!(
                "preset index {} out of range (0..{})",
                index, len
            )));
        }
        let removed = store.update(|s| s.preset_window_sizes.remove(index))?;
        info!(id = %removed.id, index, "Preset deleted");
        Ok(removed)
    }

    /// Remove every preset at `indices`; out-of-range offsets are ignored.
    pub fn delete_indices(&self, indices: &BTreeSet<usize>) -> Result<usize> {
        let removed = self.settings.lock().update(|s| {
            let before = s.preset_window_sizes.len();
            let mut i = 0;
            s.preset_window_sizes.retain(|_| {
                let keep = !indices.contains(&i);
                i += 1;
                keep
            });
            before - s.preset_window_sizes.len()
        })?;
        info!(removed, "Presets deleted");
        Ok(removed)
    }

    pub fn move_items(&self, indices: &BTreeSet<usize>, to: usize) -> Result<()> {
        self.settings
            .lock()
            .update(|s| move_items(&mut s.preset_window_sizes, indices, to))?;
        info!(?indices, to, "Presets reordered");
        Ok(())
    }

    /// Change the size of the preset with `id`, keeping its id.
    ///
    /// Returns false when no preset has that id.
    pub fn update(&self, id: Uuid, width: u32, height: u32) -> Result<bool> {
        validate(width, height)?;
        let found = self.settings.lock().update(|s| {
            match s.preset_window_sizes.iter_mut().find(|p| p.id == id) {
                Some(preset) => {
                    preset.width = width;
                    preset.height = height;
                    true
                }
                None => false,
            }
        })?;
        info!(%id, width, height, found, "Preset updated");
        Ok(found)
    }

    pub fn reset_to_default(&self) -> Result<()> {
        self.settings
            .lock()
            .update(|s| s.preset_window_sizes = default_preset_sizes())?;
        info!("Presets reset to defaults");
        Ok(())
    }
}
