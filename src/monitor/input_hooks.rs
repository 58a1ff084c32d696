//! Low-level keyboard hook callback.
//!
//! The callback runs synchronously in the Windows input pipeline on the
//! message-pump thread. It only snapshots the modifier state, translates
//! the key and hands the event to the tracker's owner thread. It must:
//! - Never take a lock
//! - Never perform I/O
//! - Always call `CallNextHookEx`

use crate::monitor::keymap::{translate_virtual_key, ModifierSnapshot};
use crate::tracker::KeySender;
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicU64, Ordering};
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, GetKeyState, VIRTUAL_KEY, VK_CAPITAL, VK_CONTROL, VK_LWIN, VK_MENU,
    VK_RWIN, VK_SHIFT,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, HC_ACTION, KBDLLHOOKSTRUCT, WM_KEYDOWN, WM_SYSKEYDOWN,
};

/// Destination for translated key events (set once at startup).
static KEY_SINK: OnceCell<KeySender> = OnceCell::new();

/// Raw key-down events seen by the hook, countable or not.
pub static RAW_KEY_EVENTS: AtomicU64 = AtomicU64::new(0);

/// Registers where the hook delivers key events.
///
/// Returns `false` if a sink was already registered.
pub fn install_key_sink(sender: KeySender) -> bool {
    KEY_SINK.set(sender).is_ok()
}

/// Number of raw key-down events observed since startup.
pub fn raw_key_event_count() -> u64 {
    RAW_KEY_EVENTS.load(Ordering::Relaxed)
}

#[inline]
unsafe fn is_down(key: VIRTUAL_KEY) -> bool {
    // High bit set while the key is held.
    (GetAsyncKeyState(key.0 as i32) as u16 & 0x8000) != 0
}

#[inline]
unsafe fn is_toggled(key: VIRTUAL_KEY) -> bool {
    (GetKeyState(key.0 as i32) & 0x0001) != 0
}

unsafe fn modifier_snapshot() -> ModifierSnapshot {
    ModifierSnapshot {
        shift: is_down(VK_SHIFT),
        control: is_down(VK_CONTROL),
        alt: is_down(VK_MENU),
        win: is_down(VK_LWIN) || is_down(VK_RWIN),
        caps_lock: is_toggled(VK_CAPITAL),
    }
}

/// Low-level keyboard hook callback.
///
/// Handles WM_KEYDOWN and WM_SYSKEYDOWN (auto-repeat included); key-up
/// events are ignored.
///
/// # Safety
/// Called by Windows from the message pump thread with a valid
/// `KBDLLHOOKSTRUCT` pointer in `lparam` when `code == HC_ACTION`.
pub unsafe extern "system" fn keyboard_hook_proc(
    code: i32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if code == HC_ACTION as i32 {
        let msg = wparam.0 as u32;

        if msg == WM_KEYDOWN || msg == WM_SYSKEYDOWN {
            RAW_KEY_EVENTS.fetch_add(1, Ordering::Relaxed);

            if let Some(sink) = KEY_SINK.get() {
                let info = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
                let event = translate_virtual_key(info.vkCode, modifier_snapshot());
                sink.send(event);
            }
        }
    }

    // CRITICAL: Always call next hook in chain
    CallNextHookEx(None, code, wparam, lparam)
}
