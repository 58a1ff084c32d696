//! Translation of Windows virtual-key codes into canonical key events.
//!
//! Kept free of any Windows API types so it builds and tests everywhere.
//! The hook callback snapshots the modifier state and passes raw values in.

use super::key_filter::{KeyCode, KeyEvent, ModifierFlags};

/// Modifier keys held (or locked) when a key went down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierSnapshot {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
    pub win: bool,
    pub caps_lock: bool,
}

impl ModifierSnapshot {
    pub fn to_flags(self) -> ModifierFlags {
        let mut flags = ModifierFlags::NONE;
        if self.caps_lock {
            flags |= ModifierFlags::CAPS_LOCK;
        }
        if self.shift {
            flags |= ModifierFlags::SHIFT;
        }
        if self.control {
            flags |= ModifierFlags::CONTROL;
        }
        if self.alt {
            flags |= ModifierFlags::OPTION;
        }
        if self.win {
            flags |= ModifierFlags::COMMAND;
        }
        flags
    }
}

// Windows virtual-key codes used below.
const VK_BACK: u32 = 0x08;
const VK_TAB: u32 = 0x09;
const VK_RETURN: u32 = 0x0D;
const VK_SHIFT: u32 = 0x10;
const VK_CONTROL: u32 = 0x11;
const VK_MENU: u32 = 0x12;
const VK_CAPITAL: u32 = 0x14;
const VK_ESCAPE: u32 = 0x1B;
const VK_SPACE: u32 = 0x20;
const VK_PRIOR: u32 = 0x21;
const VK_NEXT: u32 = 0x22;
const VK_END: u32 = 0x23;
const VK_HOME: u32 = 0x24;
const VK_LEFT: u32 = 0x25;
const VK_UP: u32 = 0x26;
const VK_RIGHT: u32 = 0x27;
const VK_DOWN: u32 = 0x28;
const VK_INSERT: u32 = 0x2D;
const VK_DELETE: u32 = 0x2E;
const VK_LWIN: u32 = 0x5B;
const VK_RWIN: u32 = 0x5C;
const VK_NUMPAD0: u32 = 0x60;
const VK_NUMPAD9: u32 = 0x69;
const VK_MULTIPLY: u32 = 0x6A;
const VK_ADD: u32 = 0x6B;
const VK_SUBTRACT: u32 = 0x6D;
const VK_DECIMAL: u32 = 0x6E;
const VK_DIVIDE: u32 = 0x6F;
const VK_F1: u32 = 0x70;
const VK_F16: u32 = 0x7F;
const VK_F24: u32 = 0x87;
const VK_LSHIFT: u32 = 0xA0;
const VK_RSHIFT: u32 = 0xA1;
const VK_LCONTROL: u32 = 0xA2;
const VK_RCONTROL: u32 = 0xA3;
const VK_LMENU: u32 = 0xA4;
const VK_RMENU: u32 = 0xA5;

/// Positional codes for A..Z.
const LETTERS: [u16; 26] = [
    0, 11, 8, 2, 14, 3, 5, 4, 34, 38, 40, 37, 46, 45, 31, 35, 12, 15, 1, 17, 32, 9, 13, 7, 16, 6,
];

/// Positional codes for the digit row 0..9.
const DIGITS: [u16; 10] = [29, 18, 19, 20, 21, 23, 22, 26, 28, 25];

/// Positional codes for keypad 0..9.
const KEYPAD_DIGITS: [u16; 10] = [82, 83, 84, 85, 86, 87, 88, 89, 91, 92];

/// Positional codes for F1..F16.
const FUNCTION_KEYS: [u16; 16] = [
    122, 120, 99, 118, 96, 97, 98, 100, 101, 109, 103, 111, 105, 107, 113, 106,
];

/// Maps a virtual-key code to its canonical code plus any flags the key
/// itself implies (keypad keys, navigation and function keys).
///
/// A modifier key carries its own flag: the hook runs before Windows
/// updates the key state, so the snapshot never shows it held.
fn canonical_key(vk: u32) -> (KeyCode, ModifierFlags) {
    let plain = |code: u16| (KeyCode(code), ModifierFlags::NONE);
    let function = |code: u16| (KeyCode(code), ModifierFlags::FUNCTION);
    let arrow = |code: u16| {
        (
            KeyCode(code),
            ModifierFlags::NUMERIC_PAD | ModifierFlags::FUNCTION,
        )
    };
    let keypad = |code: u16| (KeyCode(code), ModifierFlags::NUMERIC_PAD);

    match vk {
        0x41..=0x5A => plain(LETTERS[(vk - 0x41) as usize]),
        0x30..=0x39 => plain(DIGITS[(vk - 0x30) as usize]),
        VK_BACK => plain(KeyCode::DELETE.0),
        VK_DELETE => function(KeyCode::FORWARD_DELETE.0),
        VK_TAB => plain(KeyCode::TAB.0),
        VK_RETURN => plain(KeyCode::RETURN.0),
        VK_ESCAPE => plain(KeyCode::ESCAPE.0),
        VK_SPACE => plain(KeyCode::SPACE.0),
        0xBA => plain(41), // ;
        0xBB => plain(24), // =
        0xBC => plain(43), // ,
        0xBD => plain(27), // -
        0xBE => plain(47), // .
        0xBF => plain(44), // /
        0xC0 => plain(50), // `
        0xDB => plain(33), // [
        0xDC => plain(42), // \
        0xDD => plain(30), // ]
        0xDE => plain(39), // '
        VK_LEFT => arrow(123),
        VK_RIGHT => arrow(124),
        VK_DOWN => arrow(125),
        VK_UP => arrow(126),
        VK_HOME => function(115),
        VK_END => function(119),
        VK_PRIOR => function(116),
        VK_NEXT => function(121),
        VK_INSERT => (KeyCode(114), ModifierFlags::HELP | ModifierFlags::FUNCTION),
        VK_NUMPAD0..=VK_NUMPAD9 => keypad(KEYPAD_DIGITS[(vk - VK_NUMPAD0) as usize]),
        VK_MULTIPLY => keypad(67),
        VK_ADD => keypad(69),
        VK_SUBTRACT => keypad(78),
        VK_DECIMAL => keypad(65),
        VK_DIVIDE => keypad(75),
        VK_SHIFT | VK_LSHIFT | VK_RSHIFT => (KeyCode::UNMAPPED, ModifierFlags::SHIFT),
        VK_CONTROL | VK_LCONTROL | VK_RCONTROL => (KeyCode::UNMAPPED, ModifierFlags::CONTROL),
        VK_MENU | VK_LMENU | VK_RMENU => (KeyCode::UNMAPPED, ModifierFlags::OPTION),
        VK_LWIN | VK_RWIN => (KeyCode::UNMAPPED, ModifierFlags::COMMAND),
        VK_CAPITAL => (KeyCode(57), ModifierFlags::CAPS_LOCK),
        VK_F1..=VK_F16 => function(FUNCTION_KEYS[(vk - VK_F1) as usize]),
        0x80..=VK_F24 => (KeyCode::UNMAPPED, ModifierFlags::FUNCTION),
        _ => plain(KeyCode::UNMAPPED.0),
    }
}

/// Builds a canonical [`KeyEvent`] from a virtual-key code and the
/// modifier state observed when it went down.
pub fn translate_virtual_key(vk: u32, modifiers: ModifierSnapshot) -> KeyEvent {
    let (key_code, implied) = canonical_key(vk);
    KeyEvent::new(key_code, implied | modifiers.to_flags())
}
