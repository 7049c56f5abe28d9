//! macOS platform implementation
//!
//! The menu bar belongs to the application rather than a window. Unread counts go on the dock
//! tile, and do-not-disturb is read from the notification center defaults.
//!
//! tao's application delegate has no dock menu hook, so `applicationDockMenu:` is added to its
//! class at runtime and answers with the NSMenu behind the muda menu the app last handed over.

use super::{
    ensure_safe_external, parse_macos_dnd, PlatformCapabilities, PlatformError, PlatformManager,
    PlatformResult,
};
use cocoa::base::{id, nil};
use muda::{ContextMenu, Menu};
use objc::runtime::{class_addMethod, Class, Imp, Object, Sel, NO};
use objc::{class, msg_send, sel, sel_impl};
use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::Once;
use tao::platform::macos::WindowExtMacOS;
use tao::window::Window;
use tracing::{debug, warn};

const LAUNCH_AGENT_LABEL: &str = "com.chatwave.app";

fn launch_agent_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join("Library/LaunchAgents")
            .join(format!("{}.plist", LAUNCH_AGENT_LABEL))
    })
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// LaunchAgent that starts `exe` once per login
fn launch_agent_plist(exe: &Path) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{}</string>
    <key>ProgramArguments</key>
    <array>
        <string>{}</string>
    </array>
    <key>RunAtLoad</key>
    <true/>
</dict>
</plist>
"#,
        LAUNCH_AGENT_LABEL,
        xml_escape(&exe.display().to_string())
    )
}

/// NSMenu shown on dock right-click; owned by the muda menu the app keeps alive
static DOCK_MENU: AtomicPtr<Object> = AtomicPtr::new(std::ptr::null_mut());
static DOCK_HOOK: Once = Once::new();

extern "C" fn application_dock_menu(_this: &Object, _sel: Sel, _sender: id) -> id {
    DOCK_MENU.load(Ordering::Acquire)
}

fn install_dock_hook() {
    DOCK_HOOK.call_once(|| unsafe {
        let app: id = msg_send![class!(NSApplication), sharedApplication];
        let delegate: id = msg_send![app, delegate];
        if delegate == nil {
            warn!("No application delegate, dock menu unavailable");
            return;
        }

        let class = (*delegate).class() as *const Class as *mut Class;
        let imp: Imp = std::mem::transmute(
            application_dock_menu as extern "C" fn(&Object, Sel, id) -> id,
        );
        let types = b"@@:@\0".as_ptr() as *const c_char;
        if class_addMethod(class, sel!(applicationDockMenu:), imp, types) == NO {
            warn!("Application delegate already provides a dock menu");
        } else {
            debug!("Dock menu hook installed");
        }
    });
}

/// macOS platform manager
pub struct MacOSPlatform {
    capabilities: PlatformCapabilities,
}

impl MacOSPlatform {
    pub fn new() -> Self {
        Self {
            capabilities: PlatformCapabilities {
                supports_badge_count: true,
                supports_overlay_icon: false,
                supports_menu_bar_hiding: false,
                supports_dock_menu: true,
                platform_name: "macOS",
            },
        }
    }
}

impl Default for MacOSPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformManager for MacOSPlatform {
    fn initialize_menu(&self, _window: &Window, menu: &Menu) -> PlatformResult<()> {
        // Required for Cmd+C/V to reach the webview
        menu.init_for_nsapp();
        debug!("macOS menu initialized");
        Ok(())
    }

    fn open_external(&self, url: &str) -> PlatformResult<()> {
        ensure_safe_external(url)?;
        debug!("Opening external URL: {}", url);

        Command::new("open")
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

        Command::new("open")
            .arg(path)
            .spawn()
            .map_err(|e| PlatformError::OpenFileFailed(format!("{:?}: {}", path, e)))?;

        Ok(())
    }

    fn set_badge(&self, window: &Window, count: u32) {
        let label = (count > 0).then(|| count.to_string());
        window.set_badge_label(label);
    }

    fn set_dock_menu(&self, menu: Option<&Menu>) {
        install_dock_hook();
        let ns_menu = menu.map_or(std::ptr::null_mut(), |menu| menu.ns_menu() as id);
        DOCK_MENU.store(ns_menu, Ordering::Release);
    }

    fn set_launch_at_login(&self, exe: &Path, enabled: bool) -> PlatformResult<()> {
        let path = launch_agent_path()
            .ok_or_else(|| PlatformError::CommandFailed("HOME is not set".to_string()))?;
        debug!("Setting launch at login to {} ({:?})", enabled, path);

        let result = if enabled {
            path.parent()
                .map_or(Ok(()), std::fs::create_dir_all)
                .and_then(|()| std::fs::write(&path, launch_agent_plist(exe)))
        } else {
            match std::fs::remove_file(&path) {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            }
        };
        result.map_err(|e| PlatformError::CommandFailed(format!("{:?}: {}", path, e)))
    }

    fn do_not_disturb(&self) -> bool {
        match Command::new("defaults")
            .args([
                "-currentHost",
                "read",
                "com.apple.notificationcenterui",
                "doNotDisturb",
            ])
            .output()
        {
            Ok(output) if output.status.success() => {
                parse_macos_dnd(&String::from_utf8_lossy(&output.stdout))
            }
            // Key is absent until DND has been toggled once
            _ => false,
        }
    }

    fn capabilities(&self) -> &PlatformCapabilities {
        &self.capabilities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macos_capabilities() {
        let platform = MacOSPlatform::new();
        let caps = platform.capabilities();

        assert!(caps.supports_badge_count);
        assert!(!caps.supports_menu_bar_hiding);
        assert!(caps.supports_dock_menu);
        assert_eq!(caps.platform_name, "macOS");
    }

    #[test]
    fn test_launch_agent_plist() {
        let plist = launch_agent_plist(Path::new("/Applications/R&D Chat.app/Contents/MacOS/chatwave"));
        assert!(plist.contains("<string>com.chatwave.app</string>"));
        assert!(plist.contains("<string>/Applications/R&amp;D Chat.app/Contents/MacOS/chatwave</string>"));
        assert!(plist.contains("<key>RunAtLoad</key>"));
    }
}
