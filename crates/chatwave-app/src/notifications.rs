//! Message notifications
//!
//! The page reports each message notification with a stable numeric id. The registry keeps at
//! most one live record per id and makes sure a notification answers the page at most once,
//! however many terminal events the OS delivers for it.
//!
//! Some backends never report a close, so records also expire by age and the registry holds at
//! most `MAX_LIVE` of them.

use crate::icons;
use crate::ipc::PageMessage;
use crate::UserEvent;
use chatwave_core::config::APP_NAME;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tao::event_loop::EventLoopProxy;
use tracing::{debug, warn};

/// Body shown instead of the message text when previews are off
pub const HIDDEN_PREVIEW_BODY: &str = "You have a new message";

const MAX_LIVE: usize = 32;
const RECORD_TTL: Duration = Duration::from_secs(15 * 60);

/// A notification as reported by the page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NotificationRequest {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub silent: bool,
}

/// State the registry needs to decide whether to show anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowContext {
    pub window_focused: bool,
    pub muted: bool,
    pub preview: bool,
}

/// A notification ready for the native backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedNotification {
    pub id: u64,
    pub generation: u64,
    pub native_id: u32,
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub silent: bool,
}

/// How a notification ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationAction {
    Click,
    Reply(String),
    Close,
}

/// Terminal event from the native backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub id: u64,
    pub generation: u64,
    pub action: NotificationAction,
}

#[derive(Debug, Clone, Copy)]
struct Record {
    generation: u64,
    native_id: u32,
    shown_at: Instant,
}

/// Live notifications keyed by page id
#[derive(Debug, Default)]
pub struct NotificationRegistry {
    live: HashMap<u64, Record>,
    next_generation: u64,
    next_native_id: u32,
    /// Ids dropped without a terminal event, waiting for their icons to be removed
    expired: Vec<u64>,
}

impl NotificationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace the record for `request.id`
    ///
    /// Returns `None` when the notification is suppressed (window focused or muted).
    pub fn show(&mut self, request: NotificationRequest, ctx: ShowContext) -> Option<PreparedNotification> {
        self.show_at(request, ctx, Instant::now())
    }

    fn show_at(
        &mut self,
        request: NotificationRequest,
        ctx: ShowContext,
        now: Instant,
    ) -> Option<PreparedNotification> {
        if ctx.window_focused || ctx.muted {
            debug!(
                "Notification {} suppressed (focused: {}, muted: {})",
                request.id, ctx.window_focused, ctx.muted
            );
            return None;
        }

        self.expire(now);
        if !self.live.contains_key(&request.id) && self.live.len() >= MAX_LIVE {
            self.evict_oldest();
        }

        self.next_generation += 1;
        let generation = self.next_generation;

        // Reusing the native id makes the OS replace the bubble instead of stacking a new one
        let native_id = match self.live.get(&request.id) {
            Some(record) => record.native_id,
            None => {
                self.next_native_id = self.next_native_id.wrapping_add(1).max(1);
                self.next_native_id
            }
        };
        self.live.insert(
            request.id,
            Record {
                generation,
                native_id,
                shown_at: now,
            },
        );

        let body = if ctx.preview {
            request.body
        } else {
            HIDDEN_PREVIEW_BODY.to_string()
        };

        Some(PreparedNotification {
            id: request.id,
            generation,
            native_id,
            title: request.title,
            body,
            icon: request.icon,
            silent: request.silent,
        })
    }

    /// Accept a terminal event and produce the page callback for it
    ///
    /// Events for unknown ids, superseded generations or already-finished notifications are
    /// dropped.
    pub fn dispatch(&mut self, event: NotificationEvent) -> Option<PageMessage> {
        match self.live.get(&event.id) {
            Some(record) if record.generation == event.generation => {}
            _ => {
                debug!("Dropping stale notification event {:?}", event);
                return None;
            }
        }
        self.live.remove(&event.id);

        let message = match event.action {
            NotificationAction::Click => PageMessage::new(
                "notification-callback",
                json!({ "callbackName": "onclick", "id": event.id }),
            ),
            NotificationAction::Reply(reply) => PageMessage::new(
                "notification-reply-callback",
                json!({ "callbackName": "onclick", "id": event.id, "reply": reply }),
            ),
            NotificationAction::Close => PageMessage::new(
                "notification-callback",
                json!({ "callbackName": "onclose", "id": event.id }),
            ),
        };
        Some(message)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Ids that expired or were evicted since the last call
    pub fn drain_expired(&mut self) -> Vec<u64> {
        std::mem::take(&mut self.expired)
    }

    pub fn clear(&mut self) {
        self.live.clear();
        self.expired.clear();
    }

    fn expire(&mut self, now: Instant) {
        let expired = &mut self.expired;
        self.live.retain(|id, record| {
            let keep = now.saturating_duration_since(record.shown_at) < RECORD_TTL;
            if !keep {
                expired.push(*id);
            }
            keep
        });
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .live
            .iter()
            .min_by_key(|(_, record)| record.generation)
            .map(|(id, _)| *id);
        if let Some(id) = oldest {
            debug!("Evicting notification {}", id);
            self.live.remove(&id);
            self.expired.push(id);
        }
    }
}

/// Shows prepared notifications through notify-rust
pub struct NativeNotifier {
    proxy: EventLoopProxy<UserEvent>,
    icon_dir: PathBuf,
}

impl NativeNotifier {
    pub fn new(proxy: EventLoopProxy<UserEvent>, icon_dir: PathBuf) -> Self {
        Self { proxy, icon_dir }
    }

    pub fn show(&self, prepared: &PreparedNotification) {
        let mut notification = notify_rust::Notification::new();
        notification
            .appname(APP_NAME)
            .summary(&prepared.title)
            .body(&prepared.body)
            .id(prepared.native_id);

        match prepared.icon.as_deref().and_then(|icon| self.icon_file(prepared.id, icon)) {
            Some(path) => {
                notification.icon(&path.to_string_lossy());
            }
            None => self.forget(prepared.id),
        }

        #[cfg(all(unix, not(target_os = "macos")))]
        {
            notification.action("default", "Open");
            if prepared.silent {
                notification.hint(notify_rust::Hint::SuppressSound(true));
            }
        }

        let proxy = self.proxy.clone();
        let (id, generation) = (prepared.id, prepared.generation);
        let spawned = std::thread::Builder::new()
            .name("notification".into())
            .spawn(move || match notification.show() {
                Ok(handle) => {
                    #[cfg(all(unix, not(target_os = "macos")))]
                    handle.wait_for_action(|action| {
                        let action = match action {
                            "__closed" => NotificationAction::Close,
                            _ => NotificationAction::Click,
                        };
                        let _ = proxy.send_event(UserEvent::Notification(NotificationEvent {
                            id,
                            generation,
                            action,
                        }));
                    });

                    #[cfg(not(all(unix, not(target_os = "macos"))))]
                    {
                        let _ = (handle, proxy, id, generation);
                    }
                }
                Err(e) => warn!("Failed to show notification {}: {}", id, e),
            });

        if let Err(e) = spawned {
            warn!("Failed to spawn notification thread: {}", e);
        }
    }

    /// Show a plain informational notification (update available, etc.)
    pub fn show_info(&self, title: &str, body: &str) {
        let mut notification = notify_rust::Notification::new();
        notification.appname(APP_NAME).summary(title).body(body);
        if let Err(e) = notification.show() {
            warn!("Failed to show notification: {}", e);
        }
    }

    /// Remove the avatar written for `id`, if any
    pub fn forget(&self, id: u64) {
        if let Err(e) = std::fs::remove_file(self.icon_path(id)) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove notification icon {}: {}", id, e);
            }
        }
    }

    /// Remove every avatar written so far
    pub fn clear_icons(&self) {
        if let Err(e) = std::fs::remove_dir_all(&self.icon_dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove notification icons: {}", e);
            }
        }
    }

    fn icon_path(&self, id: u64) -> PathBuf {
        self.icon_dir.join(format!("notification-{}.png", id))
    }

    // Data URL avatars are written to disk since notification daemons only take paths
    fn icon_file(&self, id: u64, icon: &str) -> Option<PathBuf> {
        let bytes = icons::decode_data_url(icon)?;
        let path = self.icon_path(id);
        match std::fs::create_dir_all(&self.icon_dir).and_then(|_| std::fs::write(&path, bytes)) {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("Failed to write notification icon: {}", e);
                None
            }
        }
    }
}
