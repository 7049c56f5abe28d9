//! Application state
//!
//! Everything mutable lives here and is owned by the event loop thread. Worker threads only send
//! `UserEvent`s; they never hold a reference to `AppState`.

use crate::badge::BadgeRelay;
use crate::notifications::NotificationRegistry;
use crate::single_instance::InstanceGuard;
use crate::window::Lifecycle;
use chatwave_core::config::{MESSENGER_URL, WORK_CHAT_URL};
use chatwave_core::types::{Conversation, Platform};
use chatwave_core::{AppPaths, ChatwaveResult, PreferenceStore};
use chatwave_shield::RequestFilter;
use std::collections::HashSet;
use std::path::Path;
use std::process::Command;
use tracing::{error, info, warn};

const MAX_PENDING_POPUPS: usize = 8;

/// What happens once the event loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExitPlan {
    #[default]
    Exit,
    Relaunch,
    /// Delete the data directory, then relaunch
    RelaunchAfterWipe,
}

/// Central state for the Chatwave application
pub struct AppState {
    pub paths: AppPaths,
    pub platform: Platform,
    pub prefs: PreferenceStore,
    pub lifecycle: Lifecycle,
    pub notifications: NotificationRegistry,
    pub badge: BadgeRelay,
    pub filter: RequestFilter,
    /// Conversations last reported by the page
    pub conversations: Vec<Conversation>,
    conversations_seen: bool,
    /// Last polled do-not-disturb state
    pub dnd: bool,
    /// Set when the proxy window saved a change; prompts for relaunch on close
    pub proxy_dirty: bool,
    /// Frame names of blank `window.open` stubs waiting for their first URL
    pending_popups: HashSet<String>,
    pub exit: ExitPlan,
    instance: Option<InstanceGuard>,
}

impl AppState {
    pub fn new(paths: AppPaths, platform: Platform) -> Self {
        let prefs = PreferenceStore::load(paths.config_file());
        let lifecycle = Lifecycle::new(platform, prefs.get());

        Self {
            paths,
            platform,
            prefs,
            lifecycle,
            notifications: NotificationRegistry::new(),
            badge: BadgeRelay::new(platform),
            filter: RequestFilter::new(),
            conversations: Vec::new(),
            conversations_seen: false,
            dnd: false,
            proxy_dirty: false,
            pending_popups: HashSet::new(),
            exit: ExitPlan::Exit,
            instance: None,
        }
    }

    /// Hold the single-instance lock until teardown
    pub fn set_instance_guard(&mut self, guard: InstanceGuard) {
        self.instance = Some(guard);
    }

    /// Page the main window loads
    pub fn start_url(&self) -> &'static str {
        if self.prefs.get().use_work_chat {
            WORK_CHAT_URL
        } else {
            MESSENGER_URL
        }
    }

    /// Store a conversation report; returns true the first time one arrives
    pub fn record_conversations(&mut self, items: Vec<Conversation>) -> bool {
        self.conversations = items;
        let first = !self.conversations_seen && !self.conversations.is_empty();
        if first {
            self.conversations_seen = true;
        }
        first
    }

    /// Remember a blank popup the page opened under `frame_name`
    pub fn expect_popup(&mut self, frame_name: String) {
        if self.pending_popups.len() >= MAX_PENDING_POPUPS {
            warn!("Too many pending popups, forgetting older ones");
            self.pending_popups.clear();
        }
        self.pending_popups.insert(frame_name);
    }

    /// Claim the pending popup for `frame_name`; each stub is claimed at most once
    pub fn take_popup(&mut self, frame_name: &str) -> bool {
        self.pending_popups.remove(frame_name)
    }

    /// Schedule a relaunch, keeping a pending wipe if one was requested
    pub fn request_relaunch(&mut self, wipe: bool) {
        self.exit = match (self.exit, wipe) {
            (ExitPlan::RelaunchAfterWipe, _) | (_, true) => ExitPlan::RelaunchAfterWipe,
            _ => ExitPlan::Relaunch,
        };
    }

    /// Release everything in order and report what the process should do next
    ///
    /// Preferences are flushed first, then notifications and the instance lock are dropped, and
    /// only then is the data directory removed if a wipe was requested.
    pub fn teardown(&mut self) -> ExitPlan {
        if let Err(e) = self.prefs.save() {
            error!("Failed to save preferences on exit: {}", e);
        }

        self.notifications.clear();
        self.instance = None;

        if self.exit == ExitPlan::RelaunchAfterWipe {
            if let Err(e) = wipe_data_dir(self.paths.data_dir()) {
                error!("Failed to delete app data: {}", e);
            }
        }

        info!("Teardown complete ({:?})", self.exit);
        self.exit
    }
}

fn wipe_data_dir(dir: &Path) -> ChatwaveResult<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {
            info!("Deleted app data at {:?}", dir);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Start a fresh copy of the running executable with the same arguments
pub fn relaunch() -> ChatwaveResult<()> {
    let exe = std::env::current_exe()?;
    let args: Vec<_> = std::env::args_os().skip(1).collect();
    info!("Relaunching {:?}", exe);
    Command::new(&exe).args(args).spawn()?;
    Ok(())
}

/// Turn an exit plan into a process exit code, relaunching first when asked
pub fn finish(plan: ExitPlan) -> i32 {
    match plan {
        ExitPlan::Exit => 0,
        ExitPlan::Relaunch | ExitPlan::RelaunchAfterWipe => match relaunch() {
            Ok(()) => 0,
            Err(e) => {
                warn!("Relaunch failed: {}", e);
                0
            }
        },
    }
}
