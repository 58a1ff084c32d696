//! System tray module.
//!
//! The tray is the presentation layer: it shows the live WPM and forwards
//! session controls to the tracker.

pub mod icon;
pub mod menu;

pub use icon::*;
pub use menu::*;

use crate::error::{Result, TrackerError};
use crate::store::TrackerSnapshot;
use crate::tracker::TrackerHandle;
use crate::winapi_utils::post_quit_message;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tray_icon::menu::MenuEvent;
use tray_icon::{TrayIcon, TrayIconBuilder};

/// The live tray icon. Must stay on the thread that runs the message loop.
pub struct SessionTray {
    tray: TrayIcon,
    menu: SessionMenu,
    last: Option<TrackerSnapshot>,
}

impl SessionTray {
    /// Updates tooltip and menu if the snapshot changed.
    pub fn refresh(&mut self, snapshot: &TrackerSnapshot) {
        if self.last.as_ref() == Some(snapshot) {
            return;
        }

        if let Err(e) = self.tray.set_tooltip(Some(wpm_label(snapshot))) {
            tracing::debug!(error = %e, "Failed to update tray tooltip");
        }
        self.menu.refresh(snapshot);
        self.last = Some(snapshot.clone());
    }
}

/// Sets up the tray icon and menu, and starts forwarding menu clicks to
/// the tracker.
///
/// # Arguments
/// * `tracker` - Where session controls are sent
/// * `shutdown` - Set when the user quits
///
/// # Returns
/// The tray (keep it alive for the icon to stay visible) and the menu
/// handler thread.
pub fn setup_tray(
    tracker: TrackerHandle,
    shutdown: Arc<AtomicBool>,
) -> Result<(SessionTray, JoinHandle<()>)> {
    let icon = create_default_icon()?;
    let menu = SessionMenu::new();

    let tray = TrayIconBuilder::new()
        .with_tooltip(wpm_label(&tracker.snapshot()))
        .with_icon(icon)
        .with_menu(Box::new(menu.menu.clone()))
        .build()
        .map_err(|e| TrackerError::Tray(e.to_string()))?;

    let handler = spawn_menu_handler(tracker, shutdown);

    tracing::info!("System tray initialized");
    let mut tray = SessionTray {
        tray,
        menu,
        last: None,
    };
    tray.refresh(&TrackerSnapshot::default());
    Ok((tray, handler))
}

/// Spawns a thread that turns menu clicks into tracker commands.
fn spawn_menu_handler(tracker: TrackerHandle, shutdown: Arc<AtomicBool>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let receiver = MenuEvent::receiver();

        while !shutdown.load(Ordering::Relaxed) {
            if let Ok(event) = receiver.recv_timeout(Duration::from_millis(100)) {
                handle_menu_event(&event.id.0, &tracker, &shutdown);
            }
        }
    })
}

/// Handles a menu item click.
fn handle_menu_event(menu_id: &str, tracker: &TrackerHandle, shutdown: &Arc<AtomicBool>) {
    let result = match menu_id {
        MENU_ID_START => tracker.start_session(),
        MENU_ID_RESET => tracker.reset_session(),
        MENU_ID_END => tracker.end_session(),
        MENU_ID_QUIT => {
            tracing::info!("Quit requested from tray menu");
            shutdown.store(true, Ordering::SeqCst);
            post_quit_message(0);
            Ok(())
        }
        _ => {
            tracing::debug!(menu_id, "Unknown menu event");
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::warn!(menu_id, error = %e, "Menu action failed");
    }
}
