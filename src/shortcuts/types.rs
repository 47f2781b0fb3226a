//! Shortcut binding types.
//!
//! - `ModifierFlags` - CGEventFlags-compatible modifier bits
//! - `ShortcutBinding` - persisted (key code, modifier bitmask) pair
//! - `ShortcutParseError` - errors for the `cmd+shift+w` textual form

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::keycodes;

/// Errors that can occur when parsing a shortcut string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShortcutParseError {
    #[error("shortcut string is empty")]
    Empty,
    #[error("shortcut has no key, only modifiers")]
    MissingKey,
    #[error("shortcut needs at least one modifier")]
    MissingModifier,
    #[error("unknown token '{0}' in shortcut")]
    UnknownToken(String),
    #[error("unknown key '{0}'")]
    UnknownKey(String),
    #[error("key '{0}' shares code 0 with the unbound marker and can't be bound")]
    ReservedKey(String),
}

bitflags! {
    /// Modifier bits as they appear in `CGEventFlags`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModifierFlags: u64 {
        const SHIFT = 0x0002_0000;
        const CONTROL = 0x0004_0000;
        const ALTERNATE = 0x0008_0000;
        const COMMAND = 0x0010_0000;
    }
}

// Carbon modifier bits used by RegisterEventHotKey
const CARBON_CMD: u32 = 0x0100;
const CARBON_SHIFT: u32 = 0x0200;
const CARBON_OPTION: u32 = 0x0800;
const CARBON_CONTROL: u32 = 0x1000;

impl ModifierFlags {
    /// Keep only the four modifiers shortcuts compare on; event flags also
    /// carry caps lock, numeric pad and device bits.
    pub fn relevant(raw: u64) -> Self {
        Self::from_bits_truncate(raw)
    }

    pub fn from_carbon(carbon: u32) -> Self {
        let mut flags = Self::empty();
        if carbon & CARBON_CMD != 0 {
            flags |= Self::COMMAND;
        }
        if carbon & CARBON_SHIFT != 0 {
            flags |= Self::SHIFT;
        }
        if carbon & CARBON_OPTION != 0 {
            flags |= Self::ALTERNATE;
        }
        if carbon & CARBON_CONTROL != 0 {
            flags |= Self::CONTROL;
        }
        flags
    }

    pub fn to_carbon(self) -> u32 {
        let mut carbon = 0;
        if self.contains(Self::COMMAND) {
            carbon |= CARBON_CMD;
        }
        if self.contains(Self::SHIFT) {
            carbon |= CARBON_SHIFT;
        }
        if self.contains(Self::ALTERNATE) {
            carbon |= CARBON_OPTION;
        }
        if self.contains(Self::CONTROL) {
            carbon |= CARBON_CONTROL;
        }
        carbon
    }

    /// ⌃⌥⇧⌘ in the order macOS menus use
    pub fn symbols(self) -> String {
        let mut s = String::new();
        if self.contains(Self::CONTROL) {
            s.push('⌃');
        }
        if self.contains(Self::ALTERNATE) {
            s.push('⌥');
        }
        if self.contains(Self::SHIFT) {
            s.push('⇧');
        }
        if self.contains(Self::COMMAND) {
            s.push('⌘');
        }
        s
    }
}

/// A hot key as persisted in settings: virtual key code plus CGEventFlags
/// modifier bits.
///
/// Key code 0 means "unbound". An unbound binding never matches an event and
/// is never handed to the OS hot-key service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutBinding {
    #[serde(default)]
    pub key_code: u16,
    #[serde(default)]
    pub modifiers: u64,
}

impl ShortcutBinding {
    pub const UNBOUND: ShortcutBinding = ShortcutBinding {
        key_code: 0,
        modifiers: 0,
    };

    pub fn new(key_code: u16, modifiers: ModifierFlags) -> Self {
        Self {
            key_code,
            modifiers: modifiers.bits(),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.key_code != 0
    }

    pub fn flags(&self) -> ModifierFlags {
        ModifierFlags::relevant(self.modifiers)
    }

    /// Modifier-intersected equality against a key-down event.
    pub fn matches(&self, key_code: u16, event_flags: u64) -> bool {
        self.is_bound()
            && key_code == self.key_code
            && ModifierFlags::relevant(event_flags) == self.flags()
    }

    /// ⌘⇧W style description; empty for an unbound binding.
    pub fn display(&self) -> String {
        if !self.is_bound() {
            return String::new();
        }
        format!("{}{}", self.flags().symbols(), keycodes::key_label(self.key_code))
    }

    /// Parse `cmd+shift+w`, `ctrl alt f5`, `none`.
    pub fn parse(s: &str) -> Result<Self, ShortcutParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ShortcutParseError::Empty);
        }
        if s.eq_ignore_ascii_case("none") {
            return Ok(Self::UNBOUND);
        }

        let normalized = s.replace('+', " ");
        let mut modifiers = ModifierFlags::empty();
        let mut key_part: Option<&str> = None;

        for part in normalized.split_whitespace() {
            match part.to_lowercase().as_str() {
                "cmd" | "command" | "meta" | "⌘" => modifiers |= ModifierFlags::COMMAND,
                "ctrl" | "control" | "⌃" => modifiers |= ModifierFlags::CONTROL,
                "alt" | "opt" | "option" | "⌥" => modifiers |= ModifierFlags::ALTERNATE,
                "shift" | "⇧" => modifiers |= ModifierFlags::SHIFT,
                _ => {
                    if key_part.is_some() {
                        return Err(ShortcutParseError::UnknownToken(part.to_string()));
                    }
                    key_part = Some(part);
                }
            }
        }

        let key = key_part.ok_or(ShortcutParseError::MissingKey)?;
        let code = keycodes::code_for_name(key)
            .ok_or_else(|| ShortcutParseError::UnknownKey(key.to_string()))?;
        if code == 0 {
            return Err(ShortcutParseError::ReservedKey(key.to_string()));
        }
        if modifiers.is_empty() {
            return Err(ShortcutParseError::MissingModifier);
        }
        Ok(Self::new(code, modifiers))
    }
}

impl fmt::Display for ShortcutBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}
