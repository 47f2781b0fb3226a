//! Conversion from persisted bindings to `global_hotkey` hot keys.

use global_hotkey::hotkey::{HotKey, Modifiers};

use super::keycodes;
use super::types::{ModifierFlags, ShortcutBinding};

/// Build the OS hot key for a binding.
///
/// Returns None for unbound bindings and for key codes the hot-key crate has
/// no `Code` for; callers must not register anything in that case.
pub fn to_hotkey(binding: &ShortcutBinding) -> Option<HotKey> {
    if !binding.is_bound() {
        return None;
    }
    let entry = keycodes::entry_for_code(binding.key_code)?;

    let flags = binding.flags();
    let mut mods = Modifiers::empty();
    if flags.contains(ModifierFlags::COMMAND) {
        mods |= Modifiers::META;
    }
    if flags.contains(ModifierFlags::CONTROL) {
        mods |= Modifiers::CONTROL;
    }
    if flags.contains(ModifierFlags::ALTERNATE) {
        mods |= Modifiers::ALT;
    }
    if flags.contains(ModifierFlags::SHIFT) {
        mods |= Modifiers::SHIFT;
    }

    Some(HotKey::new(Some(mods), entry.hotkey_code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use global_hotkey::hotkey::Code;

    #[test]
    fn test_unbound_has_no_hotkey() {
        let binding = ShortcutBinding {
            key_code: 0,
            modifiers: (ModifierFlags::COMMAND | ModifierFlags::SHIFT).bits(),
        };
        assert!(to_hotkey(&binding).is_none());
    }

    #[test]
    fn test_pin_default_converts() {
        let binding = ShortcutBinding::new(
            keycodes::KEY_T,
            ModifierFlags::COMMAND | ModifierFlags::SHIFT,
        );
        let hotkey = to_hotkey(&binding).expect("hotkey");
        assert_eq!(
            hotkey,
            HotKey::new(Some(Modifiers::META | Modifiers::SHIFT), Code::KeyT)
        );
    }

    #[test]
    fn test_unknown_code_is_skipped() {
        let binding = ShortcutBinding::new(200, ModifierFlags::COMMAND);
        assert!(to_hotkey(&binding).is_none());
    }
}
