//! Windows platform implementation
//!
//! Windows has no numeric taskbar badge, so unread counts are shown as an overlay icon rendered
//! by the page. Do-not-disturb (Focus Assist) has no stable query API and reads as off.

use super::{
    ensure_safe_external, PlatformCapabilities, PlatformError, PlatformManager, PlatformResult,
};
use muda::Menu;
use std::path::Path;
use std::process::Command;
use tao::platform::windows::WindowExtWindows;
use tao::window::{Icon, Window};
use tracing::debug;

const RUN_KEY: &str = r"HKCU\Software\Microsoft\Windows\CurrentVersion\Run";
const RUN_VALUE: &str = "Chatwave";

/// `reg.exe` arguments that add or remove the login entry for `exe`
fn run_key_args(exe: &Path, enabled: bool) -> Vec<String> {
    let mut args = vec![
        if enabled { "add" } else { "delete" }.to_string(),
        RUN_KEY.to_string(),
        "/v".to_string(),
        RUN_VALUE.to_string(),
    ];
    if enabled {
        args.extend([
            "/t".to_string(),
            "REG_SZ".to_string(),
            "/d".to_string(),
            format!("\"{}\"", exe.display()),
        ]);
    }
    args.push("/f".to_string());
    args
}

/// Windows platform manager
pub struct WindowsPlatform {
    capabilities: PlatformCapabilities,
}

impl WindowsPlatform {
    pub fn new() -> Self {
        Self {
            capabilities: PlatformCapabilities {
                supports_badge_count: false,
                supports_overlay_icon: true,
                supports_menu_bar_hiding: true,
                supports_dock_menu: false,
                platform_name: "Windows",
            },
        }
    }
}

impl Default for WindowsPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformManager for WindowsPlatform {
    fn initialize_menu(&self, window: &Window, menu: &Menu) -> PlatformResult<()> {
        unsafe {
            menu.init_for_hwnd(window.hwnd() as _)
                .map_err(|e| PlatformError::MenuInitFailed(format!("HWND init failed: {}", e)))?;
        }

        debug!("Windows menu initialized successfully");
        Ok(())
    }

    fn set_menu_bar_visible(&self, window: &Window, menu: &Menu, visible: bool) -> PlatformResult<()> {
        let result = unsafe {
            if visible {
                menu.show_for_hwnd(window.hwnd() as _)
            } else {
                menu.hide_for_hwnd(window.hwnd() as _)
            }
        };
        result.map_err(|e| PlatformError::MenuInitFailed(e.to_string()))
    }

    fn open_external(&self, url: &str) -> PlatformResult<()> {
        ensure_safe_external(url)?;
        debug!("Opening external URL: {}", url);

        // The empty "" after start is the window title (required for URLs with special chars)
        Command::new("cmd")
            .args(["/C", "start", "", url])
            .spawn()
            .map_err(|e| PlatformError::OpenExternalFailed(format!("{}: {}", url, e)))?;

        Ok(())
    }

    fn open_path(&self, path: &Path) -> PlatformResult<()> {
        if !path.exists() {
            return Err(PlatformError::FileNotFound(path.to_path_buf()));
        }

        debug!("Opening path: {:?}", path);

        Command::new("explorer")
            .arg(path)
            .spawn()
            .map_err(|e| PlatformError::OpenFileFailed(format!("{:?}: {}", path, e)))?;

        Ok(())
    }

    fn set_launch_at_login(&self, exe: &Path, enabled: bool) -> PlatformResult<()> {
        debug!("Setting launch at login to {}", enabled);
        let output = Command::new("reg")
            .args(run_key_args(exe, enabled))
            .output()
            .map_err(|e| PlatformError::CommandFailed(format!("reg: {}", e)))?;

        // Deleting an entry that is already gone is fine
        if output.status.success() || !enabled {
            Ok(())
        } else {
            Err(PlatformError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }

    fn set_overlay_icon(&self, window: &Window, icon: Option<&Icon>) {
        window.set_overlay_icon(icon);
    }

    fn capabilities(&self) -> &PlatformCapabilities {
        &self.capabilities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_capabilities() {
        let platform = WindowsPlatform::new();
        let caps = platform.capabilities();

        assert!(!caps.supports_badge_count);
        assert!(caps.supports_overlay_icon);
        assert_eq!(caps.platform_name, "Windows");
    }

    #[test]
    fn test_run_key_args() {
        let exe = Path::new(r"C:\Program Files\Chatwave\chatwave.exe");

        let add = run_key_args(exe, true);
        assert_eq!(add[0], "add");
        assert_eq!(add[1], RUN_KEY);
        assert!(add.contains(&r#""C:\Program Files\Chatwave\chatwave.exe""#.to_string()));
        assert_eq!(add.last().map(String::as_str), Some("/f"));

        let delete = run_key_args(exe, false);
        assert_eq!(delete, ["delete", RUN_KEY, "/v", RUN_VALUE, "/f"]);
    }
}
