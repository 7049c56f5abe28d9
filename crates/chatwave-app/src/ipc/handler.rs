//! IPC message handlers
//!
//! `handle_message` applies a page message to the application state and returns what the event
//! loop must do with windows, webviews and native APIs.

use super::{resolve_script, IpcMessage, PageMessage, WindowRole};
use crate::badge::BadgeActions;
use crate::notifications::{PreparedNotification, ShowContext};
use crate::state::AppState;
use crate::window::LifecycleEvent;
use chatwave_core::config::parse_proxy_address;
use chatwave_shield::{
    evaluate_navigation, evaluate_new_window, Disposition, NavigationDecision, NavigationIntent,
    ResourceType,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, trace, warn};

/// Follow-up work for the event loop
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Run a script in the window with this role
    Eval { role: WindowRole, script: String },
    Badge(BadgeActions),
    /// PNG data URL for the taskbar overlay
    OverlayIcon(String),
    Notify(PreparedNotification),
    OpenExternal(String),
    /// Load a URL in the main webview
    LoadMain(String),
    OpenCallPopup(String),
    Lifecycle(LifecycleEvent),
    CloseWindow(WindowRole),
    RefreshMenu,
    RefreshTray,
}

impl Reply {
    fn main(script: String) -> Self {
        Reply::Eval {
            role: WindowRole::Main,
            script,
        }
    }

    fn page(message: PageMessage) -> Self {
        Reply::main(message.to_script())
    }

    fn resolve(req_id: u64, value: Value) -> Self {
        Reply::main(resolve_script(req_id, &value))
    }
}

/// Handle an IPC message from the window with `role`
pub fn handle_message(state: &mut AppState, role: WindowRole, message: IpcMessage) -> Vec<Reply> {
    if !message.allowed_from(role) {
        warn!("Ignoring {:?} from {:?} window", message, role);
        return Vec::new();
    }

    match message {
        IpcMessage::UnreadCount { count } => {
            let actions = state.badge.update(count, state.prefs.get(), state.dnd);
            vec![Reply::Badge(actions)]
        }
        IpcMessage::Conversations { items } => {
            let mut replies = vec![Reply::RefreshTray];
            if state.record_conversations(items) {
                // Messenger sorts unread conversations first
                replies.push(Reply::page(PageMessage::new("jump-to-conversation", json!(1))));
            }
            replies
        }
        IpcMessage::OverlayIcon { data, text } => {
            trace!("Overlay icon for {:?}", text);
            vec![Reply::OverlayIcon(data)]
        }
        IpcMessage::Notification(request) => {
            let prefs = state.prefs.get();
            let ctx = ShowContext {
                window_focused: state.lifecycle.is_focused(),
                muted: prefs.notifications_muted,
                preview: prefs.notification_message_preview,
            };
            state
                .notifications
                .show(request, ctx)
                .map(Reply::Notify)
                .into_iter()
                .collect()
        }
        IpcMessage::NewWindow {
            url,
            disposition,
            frame_name,
        } => {
            let mut intent = NavigationIntent::new(url, Disposition::from_name(&disposition));
            if let Some(frame_name) = frame_name {
                intent = intent.with_frame_name(frame_name);
            }
            match evaluate_new_window(&intent) {
                NavigationDecision::AllowInPlace => vec![Reply::LoadMain(intent.url)],
                NavigationDecision::OpenExternally(url) => vec![Reply::OpenExternal(url)],
                NavigationDecision::AllowRestrictedWindow => {
                    match intent.frame_name.filter(|name| !name.is_empty()) {
                        Some(name) => {
                            debug!("Call popup {:?} pending its first navigation", name);
                            state.expect_popup(name);
                        }
                        None => debug!("Ignoring unnamed blank popup"),
                    }
                    Vec::new()
                }
                NavigationDecision::Deny => Vec::new(),
            }
        }
        IpcMessage::Navigate { url, frame_name } => {
            if !state.take_popup(&frame_name) {
                warn!("Ignoring navigation of unknown popup {:?}", frame_name);
                return Vec::new();
            }
            match evaluate_navigation(&url) {
                NavigationDecision::AllowInPlace => {
                    info!("Opening call popup {:?}", frame_name);
                    vec![Reply::OpenCallPopup(url)]
                }
                NavigationDecision::OpenExternally(url) => vec![Reply::OpenExternal(url)],
                NavigationDecision::AllowRestrictedWindow | NavigationDecision::Deny => Vec::new(),
            }
        }
        IpcMessage::CheckRequest {
            req_id,
            url,
            request_type,
        } => {
            let cancel = state.filter.should_cancel(
                &url,
                state.start_url(),
                ResourceType::from_name(&request_type),
                &state.prefs.get().block,
            );
            vec![Reply::resolve(req_id, json!(cancel))]
        }
        IpcMessage::CheckResponse {
            req_id,
            url,
            content_md5,
        } => {
            let cancel = state.filter.should_cancel_response(
                &url,
                content_md5.as_deref(),
                state.prefs.get().call_ringtone_muted,
            );
            vec![Reply::resolve(req_id, json!(cancel))]
        }
        IpcMessage::DprCookie {
            req_id,
            url,
            cookie,
        } => {
            let rewritten = state
                .filter
                .rewrite_cookie_header("GET", &url, Some(&cookie));
            vec![Reply::resolve(req_id, json!(rewritten))]
        }
        IpcMessage::ConfigGet { req_id, key } => {
            let value = state.prefs.get_value(&key).unwrap_or(Value::Null);
            vec![Reply::resolve(req_id, value)]
        }
        IpcMessage::TitlebarDoubleClick => {
            vec![Reply::Lifecycle(LifecycleEvent::TitlebarDoubleClick)]
        }
        IpcMessage::Log { level, message } => {
            match level.as_str() {
                "error" => error!(target: "page", "{}", message),
                "warn" => warn!(target: "page", "{}", message),
                "debug" => debug!(target: "page", "{}", message),
                _ => info!(target: "page", "{}", message),
            }
            Vec::new()
        }
        IpcMessage::ProxySave { address, enabled } => save_proxy(state, address, enabled),
    }
}

fn proxy_result(ok: bool, message: &str) -> Reply {
    Reply::Eval {
        role: WindowRole::ProxySettings,
        script: format!(
            "window.proxySaved && window.proxySaved({}, {});",
            ok,
            json!(message)
        ),
    }
}

fn save_proxy(state: &mut AppState, address: String, enabled: bool) -> Vec<Reply> {
    let address = address.trim().to_string();
    if enabled && parse_proxy_address(&address).is_none() {
        return vec![proxy_result(
            false,
            "Enter an address like socks5://127.0.0.1:9050 or proxy.example.com:3128",
        )];
    }

    let result = state.prefs.update(|p| {
        p.use_proxy = enabled;
        p.proxy_address = address;
    });

    match result {
        Ok(changed) => {
            state.proxy_dirty |= changed;
            vec![
                proxy_result(true, "Saved"),
                Reply::RefreshMenu,
                Reply::CloseWindow(WindowRole::ProxySettings),
            ]
        }
        Err(e) => {
            error!("Failed to save proxy settings: {}", e);
            vec![proxy_result(false, &e.to_string())]
        }
    }
}
