//! macOS virtual key codes and their display labels.
//!
//! Codes are the `kVK_*` values from Carbon's `Events.h`; they are what a
//! CGEvent tap reports in `kCGKeyboardEventKeycode` and what the Carbon
//! hot-key API registers.

use global_hotkey::hotkey::Code;

/// One row of the key table
pub struct KeyEntry {
    pub code: u16,
    /// Label shown in shortcut descriptions (⌘⇧W)
    pub label: &'static str,
    /// Lower-case token accepted by `ShortcutBinding::parse`
    pub name: &'static str,
    pub hotkey_code: Code,
}

macro_rules! keys {
    ($( $code:literal => $label:literal, $name:literal, $hk:ident; )*) => {
        &[ $( KeyEntry { code: $code, label: $label, name: $name, hotkey_code: Code::$hk }, )* ]
    };
}

pub const KEY_W: u16 = 13;
pub const KEY_T: u16 = 17;

pub static KEY_TABLE: &[KeyEntry] = keys! {
    0 => "A", "a", KeyA;
    11 => "B", "b", KeyB;
    8 => "C", "c", KeyC;
    2 => "D", "d", KeyD;
    14 => "E", "e", KeyE;
    3 => "F", "f", KeyF;
    5 => "G", "g", KeyG;
    4 => "H", "h", KeyH;
    34 => "I", "i", KeyI;
    38 => "J", "j", KeyJ;
    40 => "K", "k", KeyK;
    37 => "L", "l", KeyL;
    46 => "M", "m", KeyM;
    45 => "N", "n", KeyN;
    31 => "O", "o", KeyO;
    35 => "P", "p", KeyP;
    12 => "Q", "q", KeyQ;
    15 => "R", "r", KeyR;
    1 => "S", "s", KeyS;
    17 => "T", "t", KeyT;
    32 => "U", "u", KeyU;
    9 => "V", "v", KeyV;
    13 => "W", "w", KeyW;
    7 => "X", "x", KeyX;
    16 => "Y", "y", KeyY;
    6 => "Z", "z", KeyZ;
    29 => "0", "0", Digit0;
    18 => "1", "1", Digit1;
    19 => "2", "2", Digit2;
    20 => "3", "3", Digit3;
    21 => "4", "4", Digit4;
    23 => "5", "5", Digit5;
    22 => "6", "6", Digit6;
    26 => "7", "7", Digit7;
    28 => "8", "8", Digit8;
    25 => "9", "9", Digit9;
    49 => "Space", "space", Space;
    36 => "↩", "return", Enter;
    48 => "⇥", "tab", Tab;
    51 => "⌫", "delete", Backspace;
    53 => "⎋", "escape", Escape;
    122 => "F1", "f1", F1;
    120 => "F2", "f2", F2;
    99 => "F3", "f3", F3;
    118 => "F4", "f4", F4;
    96 => "F5", "f5", F5;
    97 => "F6", "f6", F6;
    98 => "F7", "f7", F7;
    100 => "F8", "f8", F8;
    101 => "F9", "f9", F9;
    109 => "F10", "f10", F10;
    103 => "F11", "f11", F11;
    111 => "F12", "f12", F12;
};

pub fn entry_for_code(code: u16) -> Option<&'static KeyEntry> {
    KEY_TABLE.iter().find(|e| e.code == code)
}

/// Display label for a key code, `?` when the code is not in the table
pub fn key_label(code: u16) -> &'static str {
    entry_for_code(code).map(|e| e.label).unwrap_or("?")
}

/// Look a key up by its token; accepts a few common aliases.
pub fn code_for_name(name: &str) -> Option<u16> {
    let lower = name.to_lowercase();
    let canonical = match lower.as_str() {
        "enter" | "↩" => "return",
        "esc" | "⎋" => "escape",
        "backspace" | "⌫" => "delete",
        "⇥" => "tab",
        other => other,
    };
    KEY_TABLE
        .iter()
        .find(|e| e.name == canonical)
        .map(|e| e.code)
}
