//! Context menu for the system tray.

use crate::store::TrackerSnapshot;
use tray_icon::menu::accelerator::{Accelerator, Code, Modifiers};
use tray_icon::menu::{Menu, MenuId, MenuItem, PredefinedMenuItem};

/// Menu item IDs
pub const MENU_ID_START: &str = "start_session";
pub const MENU_ID_RESET: &str = "reset_session";
pub const MENU_ID_END: &str = "end_session";
pub const MENU_ID_QUIT: &str = "quit";

/// The session menu and the items that change with tracker state.
pub struct SessionMenu {
    pub menu: Menu,
    wpm: MenuItem,
    lifetime: MenuItem,
    start: MenuItem,
    reset: MenuItem,
    end: MenuItem,
}

impl SessionMenu {
    /// Builds the menu:
    ///
    /// ```text
    /// WPM: 0.00
    /// Lifetime: ...
    /// ---
    /// Start Session   Ctrl+Shift+S
    /// Reset Session   Ctrl+Shift+R
    /// End Session     Ctrl+Shift+Q
    /// ---
    /// Quit
    /// ```
    pub fn new() -> Self {
        let menu = Menu::new();

        let wpm = MenuItem::new(wpm_label(&TrackerSnapshot::default()), false, None);
        let lifetime = MenuItem::new(lifetime_label(&TrackerSnapshot::default()), false, None);
        let start = MenuItem::with_id(
            MenuId::new(MENU_ID_START),
            "Start Session",
            false,
            Some(shortcut(Code::KeyS)),
        );
        let reset = MenuItem::with_id(
            MenuId::new(MENU_ID_RESET),
            "Reset Session",
            false,
            Some(shortcut(Code::KeyR)),
        );
        let end = MenuItem::with_id(
            MenuId::new(MENU_ID_END),
            "End Session",
            false,
            Some(shortcut(Code::KeyQ)),
        );
        let quit = MenuItem::with_id(MenuId::new(MENU_ID_QUIT), "Quit", true, None);

        let _ = menu.append(&wpm);
        let _ = menu.append(&lifetime);
        let _ = menu.append(&PredefinedMenuItem::separator());
        let _ = menu.append(&start);
        let _ = menu.append(&reset);
        let _ = menu.append(&end);
        let _ = menu.append(&PredefinedMenuItem::separator());
        let _ = menu.append(&quit);

        Self {
            menu,
            wpm,
            lifetime,
            start,
            reset,
            end,
        }
    }

    /// Reflects the latest snapshot in labels and enabled states.
    ///
    /// Without capture authorization every session control is disabled.
    pub fn refresh(&self, snapshot: &TrackerSnapshot) {
        self.wpm.set_text(wpm_label(snapshot));
        self.lifetime.set_text(lifetime_label(snapshot));

        let authorized = snapshot.capture_authorized;
        self.start.set_enabled(authorized);
        self.reset.set_enabled(authorized && snapshot.is_session_started);
        self.end.set_enabled(authorized && snapshot.is_session_started);
    }
}

impl Default for SessionMenu {
    fn default() -> Self {
        Self::new()
    }
}

/// Ctrl+Shift+`key`
fn shortcut(key: Code) -> Accelerator {
    Accelerator::new(Some(Modifiers::CONTROL | Modifiers::SHIFT), key)
}

/// Label shown in the menu and the tray tooltip.
pub fn wpm_label(snapshot: &TrackerSnapshot) -> String {
    if snapshot.capture_authorized {
        format!("WPM: {}", snapshot.formatted_wpm)
    } else {
        "WPM: 0.00 (capture unavailable)".to_string()
    }
}

fn lifetime_label(snapshot: &TrackerSnapshot) -> String {
    let history = &snapshot.history;
    format!(
        "Lifetime: {} sessions, {} keys, {} WPM",
        history.sessions_completed,
        history.total_keystrokes,
        history.formatted_average_wpm()
    )
}
