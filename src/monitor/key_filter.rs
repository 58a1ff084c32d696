//! Keystroke classification.
//!
//! Decides whether a raw key-down event represents forward typing progress.
//! Deletions and any event carrying a device-independent modifier
//! (shortcuts, navigation, locked caps) are excluded from the count.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

// ============================================================================
// Key Codes
// ============================================================================

/// Canonical, layout-positional key code (0-255).
///
/// Platform backends translate their native codes into this space
/// (see [`crate::monitor::keymap`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const RETURN: KeyCode = KeyCode(36);
    pub const TAB: KeyCode = KeyCode(48);
    pub const SPACE: KeyCode = KeyCode(49);

    /// Backspace.
    pub const DELETE: KeyCode = KeyCode(51);
    pub const ESCAPE: KeyCode = KeyCode(53);

    /// Delete-to-the-right.
    pub const FORWARD_DELETE: KeyCode = KeyCode(117);

    /// Placeholder for native keys with no canonical position.
    pub const UNMAPPED: KeyCode = KeyCode(255);

    /// Keys that never count, whatever the modifier state.
    pub const EXCLUDED: [KeyCode; 2] = [KeyCode::DELETE, KeyCode::FORWARD_DELETE];

    /// Returns true if this key is in the excluded set.
    #[inline]
    pub fn is_excluded(self) -> bool {
        Self::EXCLUDED.contains(&self)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Modifier Flags
// ============================================================================

/// Modifier bitset attached to a key event.
///
/// The upper 16 bits hold device-independent modifiers. The lower 16 bits
/// carry incidental hardware detail (which side of the keyboard a modifier
/// sits on, and the like) and are ignored for classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierFlags(pub u32);

impl ModifierFlags {
    pub const NONE: ModifierFlags = ModifierFlags(0);
    pub const CAPS_LOCK: ModifierFlags = ModifierFlags(1 << 16);
    pub const SHIFT: ModifierFlags = ModifierFlags(1 << 17);
    pub const CONTROL: ModifierFlags = ModifierFlags(1 << 18);
    pub const OPTION: ModifierFlags = ModifierFlags(1 << 19);
    pub const COMMAND: ModifierFlags = ModifierFlags(1 << 20);
    pub const NUMERIC_PAD: ModifierFlags = ModifierFlags(1 << 21);
    pub const HELP: ModifierFlags = ModifierFlags(1 << 22);
    pub const FUNCTION: ModifierFlags = ModifierFlags(1 << 23);

    /// Mask selecting only the device-independent modifier bits.
    pub const DEVICE_INDEPENDENT_MASK: u32 = 0xFFFF_0000;

    /// Every named device-independent modifier.
    pub const ALL: [ModifierFlags; 8] = [
        ModifierFlags::CAPS_LOCK,
        ModifierFlags::SHIFT,
        ModifierFlags::CONTROL,
        ModifierFlags::OPTION,
        ModifierFlags::COMMAND,
        ModifierFlags::NUMERIC_PAD,
        ModifierFlags::HELP,
        ModifierFlags::FUNCTION,
    ];

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn contains(self, other: ModifierFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Drops hardware-specific bits, keeping only device-independent ones.
    #[inline]
    pub const fn device_independent(self) -> ModifierFlags {
        ModifierFlags(self.0 & Self::DEVICE_INDEPENDENT_MASK)
    }
}

impl BitOr for ModifierFlags {
    type Output = ModifierFlags;

    fn bitor(self, rhs: ModifierFlags) -> ModifierFlags {
        ModifierFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ModifierFlags {
    fn bitor_assign(&mut self, rhs: ModifierFlags) {
        self.0 |= rhs.0;
    }
}

// ============================================================================
// Key Event
// ============================================================================

/// A single key-down event. Consumed once, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key_code: KeyCode,
    pub modifier_flags: ModifierFlags,
}

impl KeyEvent {
    pub fn new(key_code: KeyCode, modifier_flags: ModifierFlags) -> Self {
        Self {
            key_code,
            modifier_flags,
        }
    }

    /// A key press with no modifiers held.
    pub fn plain(key_code: KeyCode) -> Self {
        Self::new(key_code, ModifierFlags::NONE)
    }

    #[inline]
    pub fn is_countable(&self) -> bool {
        is_countable(self.key_code, self.modifier_flags)
    }
}

/// Classifies a key event as countable typing progress.
///
/// Countable iff the key is not delete/forward-delete and no
/// device-independent modifier is set. Stateless and deterministic.
#[inline]
pub fn is_countable(key_code: KeyCode, modifier_flags: ModifierFlags) -> bool {
    !key_code.is_excluded() && modifier_flags.device_independent().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_modifier_combinations() -> Vec<ModifierFlags> {
        // Every subset of the eight named modifiers.
        (0u32..256)
            .map(|subset| {
                ModifierFlags::ALL
                    .iter()
                    .enumerate()
                    .filter(|(bit, _)| subset & (1 << bit) != 0)
                    .fold(ModifierFlags::NONE, |acc, (_, flag)| acc | *flag)
            })
            .collect()
    }

    #[test]
    fn test_excluded_keys_never_count() {
        for key in KeyCode::EXCLUDED {
            for flags in all_modifier_combinations() {
                assert!(!is_countable(key, flags), "key {} flags {:?}", key, flags);
            }
            assert!(!is_countable(key, ModifierFlags(0x0000_FFFF)));
        }
    }

    #[test]
    fn test_plain_keys_count() {
        for code in 0u16..=255 {
            let key = KeyCode(code);
            if key.is_excluded() {
                continue;
            }
            assert!(is_countable(key, ModifierFlags::NONE), "key {}", code);
        }
    }

    #[test]
    fn test_any_modifier_blocks_count() {
        let combos = all_modifier_combinations();
        for code in 0u16..=255 {
            let key = KeyCode(code);
            if key.is_excluded() {
                continue;
            }
            for flags in combos.iter().filter(|f| !f.is_empty()) {
                assert!(!is_countable(key, *flags), "key {} flags {:?}", code, flags);
            }
        }
    }

    #[test]
    fn test_hardware_bits_are_masked() {
        // Side-specific bits alone do not make a key a shortcut.
        let hardware_only = ModifierFlags(0x0000_0102);
        assert!(is_countable(KeyCode(0), hardware_only));
        assert!(!is_countable(KeyCode(0), hardware_only | ModifierFlags::SHIFT));
    }

    #[test]
    fn test_is_countable_is_deterministic() {
        let event = KeyEvent::new(KeyCode(12), ModifierFlags::COMMAND);
        let first = event.is_countable();
        for _ in 0..100 {
            assert_eq!(event.is_countable(), first);
        }
        assert!(KeyEvent::plain(KeyCode::SPACE).is_countable());
    }

    #[test]
    fn test_modifier_flag_helpers() {
        let flags = ModifierFlags::SHIFT | ModifierFlags::CONTROL;
        assert!(flags.contains(ModifierFlags::SHIFT));
        assert!(!flags.contains(ModifierFlags::OPTION));
        assert_eq!(flags.device_independent(), flags);
        assert!(ModifierFlags::default().is_empty());
    }
}
