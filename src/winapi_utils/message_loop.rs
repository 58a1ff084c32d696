//! Windows message loop.
//!
//! The keyboard hook and the tray icon both need a message pump on the
//! thread that created them. The loop also delivers a periodic tick so the
//! caller can refresh the tray from that same thread.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, KillTimer, PostThreadMessageW, SetTimer, TranslateMessage, MSG,
    WM_QUIT, WM_TIMER,
};

/// Main thread ID, for cross-thread quit signaling.
static MAIN_THREAD_ID: AtomicU32 = AtomicU32::new(0);

/// Runs the message loop until WM_QUIT, calling `on_tick` every
/// `tick_interval` on this thread.
///
/// # Important
/// If this loop stalls, Windows silently removes low-level hooks.
pub fn run_message_loop<F>(tick_interval: Duration, mut on_tick: F)
where
    F: FnMut(),
{
    let thread_id = unsafe { GetCurrentThreadId() };
    MAIN_THREAD_ID.store(thread_id, Ordering::SeqCst);

    let interval_ms = tick_interval.as_millis().clamp(10, u32::MAX as u128) as u32;
    // Thread timer: no window, WM_TIMER lands in this thread's queue.
    let timer_id = unsafe { SetTimer(None, 0, interval_ms, None) };
    if timer_id == 0 {
        tracing::warn!("Failed to create refresh timer, tray will not update");
    }

    tracing::debug!(thread_id, interval_ms, "Message loop starting");

    let mut msg = MSG::default();
    unsafe {
        // GetMessageW returns 0 on WM_QUIT and -1 on error.
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            if msg.message == WM_TIMER && msg.hwnd.0.is_null() {
                on_tick();
                continue;
            }
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }

        if timer_id != 0 {
            let _ = KillTimer(None, timer_id);
        }
    }

    tracing::debug!("Message loop exited");
}

/// Posts WM_QUIT to the thread running [`run_message_loop`].
///
/// Safe to call from any thread.
pub fn post_quit_message(exit_code: i32) {
    let main_thread_id = MAIN_THREAD_ID.load(Ordering::SeqCst);

    if main_thread_id == 0 {
        tracing::warn!("Main thread ID not set, cannot post quit message");
        return;
    }

    let result = unsafe {
        PostThreadMessageW(
            main_thread_id,
            WM_QUIT,
            WPARAM(exit_code as usize),
            LPARAM(0),
        )
    };

    match result {
        Ok(()) => tracing::debug!(exit_code, "Posted quit message to main thread"),
        Err(e) => tracing::error!(?e, "Failed to post quit message to main thread"),
    }
}
