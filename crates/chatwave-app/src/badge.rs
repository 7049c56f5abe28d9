//! Unread badge fan-out
//!
//! One unread count from the page drives several independent indicators. `BadgeRelay` decides
//! each of them from the count, the preferences and do-not-disturb; the event loop applies them.

use chatwave_core::prefs::Preferences;
use chatwave_core::types::Platform;

/// Windows taskbar overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayAction {
    Clear,
    /// Ask the page to render an overlay icon for this count
    Request(u32),
}

/// What every unread indicator should do after a count update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BadgeActions {
    /// OS badge counter; `Some(0)` clears it
    pub badge: Option<u32>,
    pub bounce_dock: bool,
    /// Tray unread decoration
    pub tray_unread: Option<bool>,
    /// Start (`true`) or stop (`false`) flashing the window frame
    pub flash_frame: Option<bool>,
    pub overlay: Option<OverlayAction>,
    /// Tray tooltip count
    pub tooltip_count: u32,
}

#[derive(Debug, Clone)]
pub struct BadgeRelay {
    platform: Platform,
    previous_count: u32,
}

impl BadgeRelay {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            previous_count: 0,
        }
    }

    pub fn count(&self) -> u32 {
        self.previous_count
    }

    pub fn update(&mut self, count: u32, prefs: &Preferences, dnd: bool) -> BadgeActions {
        let increased = count > self.previous_count;
        self.previous_count = count;

        let mac = self.platform.is_macos();
        let windows = self.platform.is_windows();
        let show = prefs.show_unread_badge;

        let badge = if windows {
            None
        } else if !show {
            Some(0)
        } else if dnd {
            None
        } else {
            Some(count)
        };

        let overlay = windows.then(|| {
            if !show || count == 0 {
                OverlayAction::Clear
            } else {
                OverlayAction::Request(count)
            }
        });

        BadgeActions {
            badge,
            bounce_dock: mac && prefs.bounce_dock_on_message && !dnd && increased,
            tray_unread: (!mac).then_some(show && count > 0),
            flash_frame: (!mac && prefs.flash_window_on_message).then_some(count != 0),
            overlay,
            tooltip_count: count,
        }
    }
}

/// Tray tooltip for an unread count
pub fn tooltip(app_name: &str, count: u32) -> String {
    match count {
        0 => app_name.to_string(),
        1 => format!("{} - 1 unread message", app_name),
        n => format!("{} - {} unread messages", app_name, n),
    }
}
