//! Keyboard hook installation.
//!
//! RAII wrapper so the low-level hook is removed when capture stops.

use windows::Win32::UI::WindowsAndMessaging::{
    SetWindowsHookExW, UnhookWindowsHookEx, HHOOK, HOOKPROC, WH_KEYBOARD_LL,
};

/// RAII guard for the low-level keyboard hook.
///
/// Calls `UnhookWindowsHookEx` when dropped.
///
/// # Example
/// ```ignore
/// let guard = HookGuard::install_keyboard_hook(Some(keyboard_hook_proc))?;
/// // ... capture is live while the message loop runs ...
/// drop(guard); // capture stops
/// ```
pub struct HookGuard {
    handle: HHOOK,
}

impl HookGuard {
    /// Installs a low-level keyboard hook.
    ///
    /// # Important
    /// - The callback must be extremely fast (< 1ms)
    /// - The callback must end with `CallNextHookEx`
    /// - The installing thread must run a message pump
    pub fn install_keyboard_hook(callback: HOOKPROC) -> windows::core::Result<Self> {
        let handle = unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, callback, None, 0)? };
        tracing::info!("Keyboard hook installed");
        Ok(Self { handle })
    }

    /// Returns the raw hook handle.
    pub fn handle(&self) -> HHOOK {
        self.handle
    }
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        match unsafe { UnhookWindowsHookEx(self.handle) } {
            Ok(_) => tracing::info!("Keyboard hook removed"),
            Err(e) => tracing::error!(error = ?e, "Failed to remove keyboard hook"),
        }
    }
}
