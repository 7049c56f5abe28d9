//! Platform abstraction layer
//!
//! Unified interface for the operations that differ across macOS, Windows, and Linux: menu bar
//! attachment, launching external handlers, unread badges and do-not-disturb detection.

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

use chatwave_shield::navigation::is_safe_external;
use muda::Menu;
use std::path::{Path, PathBuf};
use tao::window::{Icon, Window};

/// Result type for platform operations
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Platform-specific error types
#[derive(Debug, Clone)]
pub enum PlatformError {
    /// Menu initialization failed
    MenuInitFailed(String),
    /// Failed to open external URL
    OpenExternalFailed(String),
    /// URL scheme is not allowed to leave the app
    UnsafeUrl(String),
    /// Failed to open file
    OpenFileFailed(String),
    /// File not found
    FileNotFound(PathBuf),
    /// Command execution failed
    CommandFailed(String),
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformError::MenuInitFailed(msg) => write!(f, "Menu initialization failed: {}", msg),
            PlatformError::OpenExternalFailed(msg) => write!(f, "Failed to open external: {}", msg),
            PlatformError::UnsafeUrl(url) => write!(f, "Refusing to open {}", url),
            PlatformError::OpenFileFailed(msg) => write!(f, "Failed to open file: {}", msg),
            PlatformError::FileNotFound(path) => write!(f, "File not found: {:?}", path),
            PlatformError::CommandFailed(msg) => write!(f, "Command failed: {}", msg),
        }
    }
}

impl std::error::Error for PlatformError {}

/// Platform-specific capabilities
#[derive(Debug, Clone)]
pub struct PlatformCapabilities {
    /// OS badge counter on the dock or launcher
    pub supports_badge_count: bool,
    /// Taskbar overlay icons (Windows)
    pub supports_overlay_icon: bool,
    /// Menu bar can be hidden per window
    pub supports_menu_bar_hiding: bool,
    /// Right-click menu on the dock tile
    pub supports_dock_menu: bool,
    /// Platform name for logging/debugging
    pub platform_name: &'static str,
}

/// Trait for platform-specific operations
pub trait PlatformManager: Send + Sync {
    /// Attach the application menu to the window (or the app, on macOS)
    fn initialize_menu(&self, window: &Window, menu: &Menu) -> PlatformResult<()>;

    /// Show or hide the window's menu bar
    fn set_menu_bar_visible(&self, _window: &Window, _menu: &Menu, _visible: bool) -> PlatformResult<()> {
        Ok(())
    }

    /// Open a URL in the system's default handler
    ///
    /// Only `http`, `https` and `mailto` URLs are handed over.
    fn open_external(&self, url: &str) -> PlatformResult<()>;

    /// Open a file or directory with the system's default application
    fn open_path(&self, path: &Path) -> PlatformResult<()>;

    /// Set the unread counter on the dock or launcher; 0 clears it
    fn set_badge(&self, _window: &Window, _count: u32) {}

    /// Set or clear the taskbar overlay icon
    fn set_overlay_icon(&self, _window: &Window, _icon: Option<&Icon>) {}

    /// Replace the dock menu; the caller keeps `menu` alive until the next call
    fn set_dock_menu(&self, _menu: Option<&Menu>) {}

    /// Start `exe` when the user logs in, or stop doing so
    fn set_launch_at_login(&self, _exe: &Path, _enabled: bool) -> PlatformResult<()> {
        Err(PlatformError::CommandFailed(
            "Launch at login is not supported here".to_string(),
        ))
    }

    /// Whether the OS is in do-not-disturb mode
    fn do_not_disturb(&self) -> bool {
        false
    }

    /// Get the platform's capabilities
    fn capabilities(&self) -> &PlatformCapabilities;

    /// Get the platform name for logging
    fn platform_name(&self) -> &'static str {
        self.capabilities().platform_name
    }
}

/// Reject URLs that must never reach the system handler
pub fn ensure_safe_external(url: &str) -> PlatformResult<()> {
    if is_safe_external(url) {
        Ok(())
    } else {
        tracing::warn!("Refusing to open external URL: {}", url);
        Err(PlatformError::UnsafeUrl(url.to_string()))
    }
}

/// Get the platform manager for the current operating system
pub fn get_platform_manager() -> Box<dyn PlatformManager> {
    #[cfg(target_os = "macos")]
    {
        Box::new(macos::MacOSPlatform::new())
    }

    #[cfg(target_os = "windows")]
    {
        Box::new(windows::WindowsPlatform::new())
    }

    #[cfg(target_os = "linux")]
    {
        Box::new(linux::LinuxPlatform::new())
    }
}

/// `gsettings get org.gnome.desktop.notifications show-banners` prints `false` while DND is on
pub fn parse_gnome_show_banners(output: &str) -> bool {
    output.trim() == "false"
}

/// `defaults -currentHost read com.apple.notificationcenterui doNotDisturb` prints `1` while on
pub fn parse_macos_dnd(output: &str) -> bool {
    output.trim() == "1"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_manager_exists() {
        let platform = get_platform_manager();
        assert!(!platform.platform_name().is_empty());
    }

    #[test]
    fn test_unsafe_urls_refused() {
        assert!(ensure_safe_external("https://example.com/").is_ok());
        assert!(ensure_safe_external("mailto:someone@example.com").is_ok());
        assert!(matches!(
            ensure_safe_external("file:///etc/passwd"),
            Err(PlatformError::UnsafeUrl(_))
        ));
        assert!(ensure_safe_external("javascript:alert(1)").is_err());
        assert!(ensure_safe_external("not a url").is_err());
    }

    #[test]
    fn test_open_external_refuses_unsafe_scheme() {
        let platform = get_platform_manager();
        assert!(platform.open_external("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_dnd_parsers() {
        assert!(parse_gnome_show_banners("false\n"));
        assert!(!parse_gnome_show_banners("true\n"));
        assert!(!parse_gnome_show_banners(""));
        assert!(parse_macos_dnd("1\n"));
        assert!(!parse_macos_dnd("0"));
    }

    #[test]
    fn test_error_display() {
        let err = PlatformError::UnsafeUrl("file:///x".into());
        assert_eq!(err.to_string(), "Refusing to open file:///x");
    }
}
