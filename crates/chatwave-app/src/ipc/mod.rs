//! IPC between the Messenger page and the application
//!
//! The injected bridge posts JSON messages tagged with `cmd`. The application answers with
//! `chatwave-action` DOM events and resolves pending requests by id.

pub mod handler;

use crate::notifications::NotificationRequest;
use chatwave_core::types::{Conversation, Platform};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Script injected into the main Messenger webview
const BRIDGE_TEMPLATE: &str = include_str!("../ui/bridge.js");
/// Script injected into call popups
pub const CALL_BRIDGE: &str = include_str!("../ui/call_bridge.js");

const MARKERS_PLACEHOLDER: &str = "__CHATWAVE_BEACON_MARKERS__";
const PLATFORM_PLACEHOLDER: &str = "__CHATWAVE_PLATFORM__";

/// Main-window bridge with the beacon markers and platform filled in
pub fn bridge_script(beacon_markers: &[&str], platform: Platform) -> String {
    let markers = serde_json::to_string(beacon_markers).unwrap_or_else(|_| "[]".to_string());
    let platform = serde_json::to_string(platform.name()).unwrap_or_else(|_| "\"\"".to_string());
    BRIDGE_TEMPLATE
        .replace(MARKERS_PLACEHOLDER, &markers)
        .replace(PLATFORM_PLACEHOLDER, &platform)
}

/// Sets Messenger's `locale` cookie before the page scripts run
///
/// Only pages on messenger.com receive it; the locale is expected in `ll_CC` form.
pub fn locale_cookie_script(locale: &str) -> String {
    let cookie = format!("locale={}; path=/; domain=.messenger.com; secure", locale);
    let cookie = serde_json::to_string(&cookie).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "if (/(^|\\.)messenger\\.com$/.test(location.hostname)) {{ document.cookie = {}; }}",
        cookie
    )
}

/// IPC message from JavaScript to Rust
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum IpcMessage {
    // Unread state
    UnreadCount {
        count: u32,
    },
    Conversations {
        items: Vec<Conversation>,
    },
    OverlayIcon {
        data: String,
        #[serde(default)]
        text: String,
    },

    // Notifications
    Notification(NotificationRequest),

    // Navigation
    NewWindow {
        url: String,
        #[serde(default)]
        disposition: String,
        #[serde(default)]
        frame_name: Option<String>,
    },
    /// A call popup opened through `window.open` is being pointed somewhere
    Navigate {
        url: String,
        frame_name: String,
    },

    // Request filter
    CheckRequest {
        req_id: u64,
        url: String,
        #[serde(default)]
        request_type: String,
    },
    CheckResponse {
        req_id: u64,
        url: String,
        #[serde(default)]
        content_md5: Option<String>,
    },
    DprCookie {
        req_id: u64,
        url: String,
        #[serde(default)]
        cookie: String,
    },

    // Preferences
    ConfigGet {
        req_id: u64,
        key: String,
    },

    // Window
    TitlebarDoubleClick,

    // Diagnostics
    Log {
        level: String,
        message: String,
    },

    // Proxy settings window
    ProxySave {
        address: String,
        enabled: bool,
    },
}

/// Which window a message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRole {
    Main,
    CallPopup,
    ProxySettings,
    Versions,
}

impl IpcMessage {
    /// Auxiliary windows may only send the handful of commands their page needs
    pub fn allowed_from(&self, role: WindowRole) -> bool {
        match role {
            WindowRole::Main => !matches!(self, IpcMessage::ProxySave { .. }),
            WindowRole::ProxySettings => {
                matches!(self, IpcMessage::ProxySave { .. } | IpcMessage::Log { .. })
            }
            WindowRole::CallPopup | WindowRole::Versions => matches!(self, IpcMessage::Log { .. }),
        }
    }
}

/// An action dispatched to the page as a `chatwave-action` event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageMessage {
    pub name: &'static str,
    pub payload: Value,
}

impl PageMessage {
    pub fn new(name: &'static str, payload: Value) -> Self {
        Self { name, payload }
    }

    pub fn bare(name: &'static str) -> Self {
        Self::new(name, Value::Null)
    }

    pub fn to_script(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "null".to_string());
        format!(
            "window.__chatwave && window.__chatwave.dispatch({});",
            json
        )
    }
}

/// Resolve a pending bridge request
pub fn resolve_script(req_id: u64, value: &Value) -> String {
    format!(
        "window.__chatwave && window.__chatwave.resolve({}, {});",
        req_id, value
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_messages() {
        let msg: IpcMessage = serde_json::from_str(r#"{"cmd":"unread_count","count":4}"#).unwrap();
        assert!(matches!(msg, IpcMessage::UnreadCount { count: 4 }));

        let msg: IpcMessage = serde_json::from_str(
            r#"{"cmd":"notification","id":3,"title":"Ann","body":"hi","silent":true}"#,
        )
        .unwrap();
        match msg {
            IpcMessage::Notification(request) => {
                assert_eq!(request.id, 3);
                assert!(request.silent);
            }
            other => panic!("unexpected {:?}", other),
        }

        let msg: IpcMessage = serde_json::from_str(r#"{"cmd":"titlebar_double_click"}"#).unwrap();
        assert!(matches!(msg, IpcMessage::TitlebarDoubleClick));

        let msg: IpcMessage = serde_json::from_str(
            r#"{"cmd":"conversations","items":[{"label":"Ann","unread":true},{"label":"Bo"}]}"#,
        )
        .unwrap();
        match msg {
            IpcMessage::Conversations { items } => {
                assert_eq!(items.len(), 2);
                assert!(!items[1].unread);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(serde_json::from_str::<IpcMessage>(r#"{"cmd":"format_disk"}"#).is_err());
    }

    #[test]
    fn test_page_cannot_write_preferences() {
        // Preferences change only through menu and tray commands
        for raw in [
            r#"{"cmd":"config_set","key":"zoomFactor","value":5.0}"#,
            r#"{"cmd":"config_set","key":"useWorkChat","value":true}"#,
            r#"{"cmd":"mute_state","muted":true}"#,
        ] {
            assert!(serde_json::from_str::<IpcMessage>(raw).is_err(), "{}", raw);
        }
    }

    #[test]
    fn test_aux_windows_are_restricted() {
        let save = IpcMessage::ProxySave {
            address: "socks5://127.0.0.1:9050".into(),
            enabled: true,
        };
        let unread = IpcMessage::UnreadCount { count: 2 };
        let log = IpcMessage::Log {
            level: "info".into(),
            message: "hello".into(),
        };

        assert!(save.allowed_from(WindowRole::ProxySettings));
        assert!(!save.allowed_from(WindowRole::Main));
        assert!(!unread.allowed_from(WindowRole::CallPopup));
        assert!(!unread.allowed_from(WindowRole::Versions));
        assert!(unread.allowed_from(WindowRole::Main));
        assert!(log.allowed_from(WindowRole::CallPopup));
    }

    #[test]
    fn test_page_message_script() {
        let script = PageMessage::new("set-theme", json!({"theme": "dark"})).to_script();
        assert_eq!(
            script,
            r#"window.__chatwave && window.__chatwave.dispatch({"name":"set-theme","payload":{"theme":"dark"}});"#
        );
        assert!(PageMessage::bare("reload").to_script().contains(r#""payload":null"#));
    }

    #[test]
    fn test_resolve_script() {
        assert_eq!(
            resolve_script(9, &json!(true)),
            "window.__chatwave && window.__chatwave.resolve(9, true);"
        );
    }

    #[test]
    fn test_bridge_placeholders_filled() {
        let script = bridge_script(&["typ.php", "delivery_receipts"], Platform::Linux);
        assert!(!script.contains(MARKERS_PLACEHOLDER));
        assert!(!script.contains(PLATFORM_PLACEHOLDER));
        assert!(script.contains(r#"["typ.php","delivery_receipts"]"#));
    }

    #[test]
    fn test_locale_cookie_script() {
        let script = locale_cookie_script("de_DE");
        assert!(script.contains(r#"document.cookie = "locale=de_DE; path=/; domain=.messenger.com; secure";"#));
        assert!(script.starts_with(r"if (/(^|\.)messenger\.com$/.test(location.hostname))"));
    }
}
