//! Main window lifecycle
//!
//! `Lifecycle` is a platform-free state machine: the event loop feeds it window-system events and
//! executes the ordered actions it returns against the real tao window. Keeping the decisions
//! here means the hide-instead-of-close rules can be tested without a display.

use chatwave_core::prefs::Preferences;
use chatwave_core::types::{Bounds, Platform};

/// Something that happened to the main window or the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The user asked to close the main window
    CloseRequested,
    /// The window moved, resized, or changed state
    Geometry {
        bounds: Bounds,
        maximized: bool,
        minimized: bool,
        fullscreen: bool,
    },
    Focused(bool),
    /// Tray click, dock activation, notification click
    ShowRequested,
    /// Tray icon click on platforms where it toggles
    ToggleVisibility,
    /// Another launch handed off to this instance
    SecondInstance,
    DisplayRemoved,
    TitlebarDoubleClick,
    QuitRequested,
}

/// Operation the event loop must perform, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    ExitFullscreen,
    Blur,
    Hide,
    /// Hide the whole application (macOS)
    HideApplication,
    Show,
    Restore,
    Focus,
    SetBounds(Bounds),
    SetPosition { x: i32, y: i32 },
    Maximize,
    Unmaximize,
    StopFlash,
    /// Persist normal bounds (when known) and the maximized flag
    SaveGeometry {
        bounds: Option<Bounds>,
        maximized: bool,
    },
    Quit,
}

/// Main window state machine
#[derive(Debug, Clone)]
pub struct Lifecycle {
    platform: Platform,
    visible: bool,
    focused: bool,
    minimized: bool,
    maximized: bool,
    fullscreen: bool,
    quitting: bool,
    hide_after_fullscreen: bool,
    shown_once: bool,
    normal_bounds: Option<Bounds>,
    last_position: Option<(i32, i32)>,
}

impl Lifecycle {
    /// Start in the created-but-hidden state, seeded with the saved geometry
    pub fn new(platform: Platform, prefs: &Preferences) -> Self {
        let state = prefs.last_window_state;
        let normal_bounds = match (state.x, state.y) {
            (Some(x), Some(y)) => Some(Bounds::new(x, y, state.width, state.height)),
            _ => None,
        };

        Self {
            platform,
            visible: false,
            focused: false,
            minimized: false,
            maximized: false,
            fullscreen: false,
            quitting: false,
            hide_after_fullscreen: false,
            shown_once: false,
            normal_bounds,
            last_position: normal_bounds.map(|b| (b.x, b.y)),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_focused(&self) -> bool {
        self.visible && self.focused
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    pub fn normal_bounds(&self) -> Option<Bounds> {
        self.normal_bounds
    }

    /// First show after the page has loaded. Runs once; a minimized launch stays hidden.
    pub fn initial_show(&mut self, prefs: &Preferences) -> Vec<LifecycleAction> {
        if self.shown_once {
            return Vec::new();
        }
        self.shown_once = true;

        if prefs.launch_minimized {
            return Vec::new();
        }

        let mut actions = Vec::new();
        if prefs.last_window_state.is_maximized {
            actions.push(LifecycleAction::Maximize);
        }
        actions.push(LifecycleAction::Show);
        actions.push(LifecycleAction::Focus);
        self.visible = true;
        actions
    }

    pub fn handle(&mut self, event: LifecycleEvent, prefs: &Preferences) -> Vec<LifecycleAction> {
        match event {
            LifecycleEvent::CloseRequested => self.on_close(prefs),
            LifecycleEvent::Geometry {
                bounds,
                maximized,
                minimized,
                fullscreen,
            } => self.on_geometry(bounds, maximized, minimized, fullscreen),
            LifecycleEvent::Focused(focused) => {
                self.focused = focused;
                if focused && prefs.flash_window_on_message {
                    vec![LifecycleAction::StopFlash]
                } else {
                    Vec::new()
                }
            }
            LifecycleEvent::ShowRequested => self.show(false),
            LifecycleEvent::SecondInstance => self.show(true),
            LifecycleEvent::ToggleVisibility => {
                if self.visible {
                    self.hide()
                } else {
                    self.show(false)
                }
            }
            LifecycleEvent::DisplayRemoved => match self.last_position {
                Some((x, y)) => vec![LifecycleAction::SetPosition { x, y }],
                None => Vec::new(),
            },
            LifecycleEvent::TitlebarDoubleClick => {
                if self.maximized {
                    vec![LifecycleAction::Unmaximize]
                } else {
                    vec![LifecycleAction::Maximize]
                }
            }
            LifecycleEvent::QuitRequested => self.quit(),
        }
    }

    fn on_close(&mut self, prefs: &Preferences) -> Vec<LifecycleAction> {
        if self.quitting || prefs.quit_on_window_close {
            return self.quit();
        }

        if self.fullscreen {
            // Hiding a fullscreen window leaves a black screen on some platforms
            self.hide_after_fullscreen = true;
            return vec![LifecycleAction::ExitFullscreen];
        }

        self.hide()
    }

    fn on_geometry(
        &mut self,
        bounds: Bounds,
        maximized: bool,
        minimized: bool,
        fullscreen: bool,
    ) -> Vec<LifecycleAction> {
        let mut actions = Vec::new();
        let mut dirty = maximized != self.maximized && !minimized;

        self.maximized = maximized;
        self.minimized = minimized;
        self.fullscreen = fullscreen;

        if !maximized && !minimized && !fullscreen {
            self.last_position = Some((bounds.x, bounds.y));
            if self.normal_bounds != Some(bounds) {
                self.normal_bounds = Some(bounds);
                dirty = true;
            }
        }

        if dirty {
            actions.push(LifecycleAction::SaveGeometry {
                bounds: self.normal_bounds,
                maximized: self.maximized,
            });
        }

        if self.hide_after_fullscreen && !fullscreen {
            self.hide_after_fullscreen = false;
            actions.extend(self.hide());
        }

        actions
    }

    fn hide(&mut self) -> Vec<LifecycleAction> {
        self.visible = false;
        self.focused = false;

        let hide = if self.platform.is_macos() {
            LifecycleAction::HideApplication
        } else {
            LifecycleAction::Hide
        };
        vec![LifecycleAction::Blur, hide]
    }

    fn show(&mut self, force_restore: bool) -> Vec<LifecycleAction> {
        let mut actions = Vec::new();

        if self.minimized || force_restore {
            actions.push(LifecycleAction::Restore);
            self.minimized = false;
        }

        if !self.visible && !self.maximized && !self.fullscreen {
            if let Some(bounds) = self.normal_bounds {
                actions.push(LifecycleAction::SetBounds(bounds));
            }
        }

        actions.push(LifecycleAction::Show);
        actions.push(LifecycleAction::Focus);
        self.visible = true;
        self.shown_once = true;
        self.hide_after_fullscreen = false;
        actions
    }

    fn quit(&mut self) -> Vec<LifecycleAction> {
        self.quitting = true;
        vec![
            LifecycleAction::SaveGeometry {
                bounds: self.normal_bounds,
                maximized: self.maximized,
            },
            LifecycleAction::Quit,
        ]
    }
}
