//! Shared types for Chatwave

use serde::{Deserialize, Serialize};

/// Desktop platform the app is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
}

impl Platform {
    /// Platform of the running binary.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    pub fn is_macos(&self) -> bool {
        matches!(self, Platform::MacOs)
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Platform::MacOs => "macOS",
            Platform::Linux => "Linux",
            Platform::Windows => "Windows",
        }
    }
}

/// Saved geometry of the main window.
///
/// Position is optional so that a fresh install lets the window manager place the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub is_maximized: bool,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            width: 800,
            height: 600,
            is_maximized: false,
        }
    }
}

/// Normal (non-maximized, non-fullscreen) window bounds in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Geometry record for persistence, carrying the given maximized flag.
    pub fn to_state(self, is_maximized: bool) -> WindowState {
        WindowState {
            x: Some(self.x),
            y: Some(self.y),
            width: self.width,
            height: self.height,
            is_maximized,
        }
    }
}

/// A conversation entry reported by the page for quick-jump menus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub label: String,
    #[serde(default)]
    pub unread: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_state_camel_case() {
        let state = WindowState {
            x: Some(10),
            y: Some(20),
            width: 1024,
            height: 768,
            is_maximized: true,
        };
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(json["isMaximized"], true);
        assert_eq!(json["width"], 1024);
    }

    #[test]
    fn test_window_state_without_position() {
        let state: WindowState = serde_json::from_str(r#"{"width":640,"height":480}"#).unwrap();
        assert_eq!(state.x, None);
        assert!(!state.is_maximized);
        assert!(!serde_json::to_string(&state).unwrap().contains("\"x\""));
    }

    #[test]
    fn test_bounds_to_state() {
        let state = Bounds::new(5, 6, 700, 500).to_state(false);
        assert_eq!(state.x, Some(5));
        assert_eq!(state.height, 500);
    }
}
