//! Linux platform implementation
//!
//! The menu bar lives in the GTK window's default vbox. External handlers go through xdg-open,
//! and the launcher badge uses the Unity count API that most docks understand.

use super::{
    ensure_safe_external, parse_gnome_show_banners, PlatformCapabilities, PlatformError,
    PlatformManager, PlatformResult,
};
use muda::Menu;
use std::path::Path;
use std::process::Command;
use tao::platform::unix::WindowExtUnix;
use tao::window::Window;
use tracing::{debug, warn};

const DESKTOP_FILE: &str = "chatwave.desktop";

/// Linux platform manager
pub struct LinuxPlatform {
    capabilities: PlatformCapabilities,
}

impl LinuxPlatform {
    pub fn new() -> Self {
        Self {
            capabilities: PlatformCapabilities {
                supports_badge_count: true,
                supports_overlay_icon: false,
                supports_menu_bar_hiding: true,
                supports_dock_menu: false,
                platform_name: "Linux",
            },
        }
    }
}

impl Default for LinuxPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformManager for LinuxPlatform {
    fn initialize_menu(&self, window: &Window, menu: &Menu) -> PlatformResult<()> {
        match window.default_vbox() {
            Some(vbox) => menu
                .init_for_gtk_window(window.gtk_window(), Some(vbox))
                .map_err(|e| PlatformError::MenuInitFailed(format!("GTK init failed: {}", e)))?,
            None => {
                // Don't fail - the app is usable without a menu bar
                warn!("GTK vbox not available for menu initialization");
                return Ok(());
            }
        }

        debug!("Linux menu initialized successfully");
        Ok(())
    }

    fn set_menu_bar_visible(&self, window: &Window, menu: &Menu, visible: bool) -> PlatformResult<()> {
        let result = if visible {
            menu.show_for_gtk_window(window.gtk_window())
        } else {
            menu.hide_for_gtk_window(window.gtk_window())
        };
        result.map_err(|e| PlatformError::MenuInitFailed(e.to_string()))
    }

    fn open_external(&self, url: &str) -> PlatformResult<()> {
        ensure_safe_external(url)?;
        debug!("Opening external URL: {}", url);

        Command::new("xdg-open")
            .arg(url)
            .spawn()
            .map_err(|e| PlatformError::OpenExternalFailed(format!("{}: {}", url, e)))?;

        Ok(())
    }

    fn open_path(&self, path: &Path) -> PlatformResult<()> {
        if !path.exists() {
            return Err(PlatformError::FileNotFound(path.to_path_buf()));
        }

        debug!("Opening path: {:?}", path);

        Command::new("xdg-open")
            .arg(path)
            .spawn()
            .map_err(|e| PlatformError::OpenFileFailed(format!("{:?}: {}", path, e)))?;

        Ok(())
    }

    fn set_badge(&self, window: &Window, count: u32) {
        let count = (count > 0).then_some(i64::from(count));
        window.set_badge_count(count, Some(DESKTOP_FILE.to_string()));
    }

    fn do_not_disturb(&self) -> bool {
        match Command::new("gsettings")
            .args(["get", "org.gnome.desktop.notifications", "show-banners"])
            .output()
        {
            Ok(output) if output.status.success() => {
                parse_gnome_show_banners(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(_) => false,
            Err(e) => {
                debug!("gsettings unavailable: {}", e);
                false
            }
        }
    }

    fn capabilities(&self) -> &PlatformCapabilities {
        &self.capabilities
    }
}
