//! Key/shortcut codec.
//!
//! Translates macOS virtual key codes and modifier bitmasks into displayable
//! shortcut descriptions and back, and into hot keys the OS can register.
//!
//! # Example
//!
//! ```ignore
//! use mactools::shortcuts::ShortcutBinding;
//!
//! let binding = ShortcutBinding::parse("cmd+shift+w")?;
//! println!("Display: {}", binding.display()); // ⌘⇧W
//! ```

mod hotkey_compat;
pub mod keycodes;
mod types;


pub use hotkey_compat::to_hotkey;
pub use types::{ModifierFlags, ShortcutBinding, ShortcutParseError};
