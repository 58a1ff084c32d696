//! wpmon - Typing Speed Tracker
//!
//! Runs silently with a system tray icon showing the live WPM of the
//! current session.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

#[cfg(windows)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    app::main()
}

#[cfg(not(windows))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    tracing::error!("wpmon needs a Windows keyboard hook; this platform is not supported");
    Err("unsupported platform".into())
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wpmon=info")),
        )
        .init();
}

#[cfg(windows)]
mod app {
    use super::init_logging;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use wpmon::config::TrackerConfig;
    use wpmon::instance::{default_lock_path, InstanceLock};
    use wpmon::monitor::*;
    use wpmon::store::{AggregateHistory, MonotonicClock};
    use wpmon::tracker::{start_tracker, Tracker};
    use wpmon::tray::setup_tray;
    use wpmon::winapi_utils::*;

    pub fn main() -> Result<(), Box<dyn std::error::Error>> {
        init_logging();

        // Only one tracker may own the keyboard hook and the tray icon.
        match InstanceLock::acquire(default_lock_path(), is_process_running)? {
            Some(lock) => run_application(lock),
            None => {
                show_already_running();
                Ok(())
            }
        }
    }

    fn show_already_running() {
        use windows::Win32::UI::WindowsAndMessaging::{MessageBoxW, MB_ICONWARNING, MB_OK};

        unsafe {
            MessageBoxW(
                None,
                windows::core::w!("wpmon is already running.\n\nCheck the system tray for the WPM icon."),
                windows::core::w!("wpmon - Already Running"),
                MB_OK | MB_ICONWARNING,
            );
        }
    }

    /// Whether a process with this PID is still running.
    fn is_process_running(pid: u32) -> bool {
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::{OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION};

        unsafe {
            match OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) {
                Ok(handle) => {
                    let _ = CloseHandle(handle);
                    true
                }
                Err(_) => false,
            }
        }
    }

    fn run_application(_lock: InstanceLock) -> Result<(), Box<dyn std::error::Error>> {
        let config = TrackerConfig::from_env();
        tracing::info!(?config, "Starting wpmon");

        let provider: Arc<dyn AuthorizationProvider> = Arc::new(AlwaysAuthorized);
        let tracker = start_tracker(&config, MonotonicClock::new(), provider.is_trusted())?;
        let handle = tracker.handle().clone();

        // Poll cycles run on the tracker's runtime.
        let gate = PermissionGate::new(provider, tracker.runtime().clone());
        if !gate.request_authorization() {
            tracing::warn!("Input monitoring not authorized, waiting for grant");
            let granted = handle.clone();
            gate.poll_until_authorized(config.permission_poll_interval, move || {
                if let Err(e) = granted.permission_granted() {
                    tracing::warn!(error = %e, "Could not report authorization grant");
                }
            });
        }

        if !install_key_sink(handle.key_sender()) {
            tracing::warn!("Key sink already installed");
        }
        spawn_event_logger(&tracker);

        let shutdown = Arc::new(AtomicBool::new(false));

        let tray = match setup_tray(handle.clone(), Arc::clone(&shutdown)) {
            Ok(tray) => Some(tray),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to create system tray, continuing without it");
                None
            }
        };
        let (mut tray, menu_thread) = match tray {
            Some((tray, thread)) => (Some(tray), Some(thread)),
            None => (None, None),
        };

        let shutdown_ctrlc = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            tracing::info!("Shutdown signal received");
            shutdown_ctrlc.store(true, Ordering::SeqCst);
            post_quit_message(0);
        })?;

        let mut keyboard_hook: Option<HookGuard> = None;
        let snapshots = handle.watch();

        tracing::info!("Running message loop");
        run_message_loop(config.refresh_interval, || {
            let snapshot = snapshots.borrow().clone();

            if snapshot.capture_authorized && keyboard_hook.is_none() {
                match HookGuard::install_keyboard_hook(Some(keyboard_hook_proc)) {
                    Ok(guard) => keyboard_hook = Some(guard),
                    Err(e) => tracing::error!(error = %e, "Failed to install keyboard hook"),
                }
            }

            if let Some(tray) = tray.as_mut() {
                tray.refresh(&snapshot);
            }
        });

        tracing::info!("Shutting down");
        shutdown.store(true, Ordering::SeqCst);
        gate.cancel();
        drop(keyboard_hook);

        if let Some(thread) = menu_thread {
            let _ = thread.join();
        }
        drop(tray);

        drop(handle);
        let history = tracker.shutdown()?;
        print_summary(&history);
        Ok(())
    }

    /// Logs tracker lifecycle events as they happen.
    fn spawn_event_logger(tracker: &Tracker) {
        let mut events = tracker.handle().subscribe();
        tracker.runtime().spawn(async move {
            use tokio::sync::broadcast::error::RecvError;
            loop {
                match events.recv().await {
                    Ok(event) => tracing::info!(event = %event.to_json(), "Session event"),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Event logger lagged")
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    fn print_summary(history: &AggregateHistory) {
        println!();
        println!("════════════════════════════════════════════════════════════════");
        println!("📊 Typing Summary");
        println!("════════════════════════════════════════════════════════════════");
        println!("   Sessions:      {}", history.sessions_completed);
        println!("   Keystrokes:    {}", history.total_keystrokes);
        println!("   Typing Time:   {}s", history.total_elapsed.as_secs());
        println!("   Average WPM:   {}", history.formatted_average_wpm());
        println!("   Raw Key Downs: {}", raw_key_event_count());
        println!("════════════════════════════════════════════════════════════════");
    }
}
