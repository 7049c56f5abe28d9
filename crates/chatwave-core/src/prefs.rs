//! Persistent user preferences
//!
//! Every preference has a default, so reads never fail. The whole set is stored as one camelCase
//! JSON document and is flushed to disk after every mutation.

use crate::error::{ChatwaveError, ChatwaveResult};
use crate::types::{Bounds, WindowState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const ZOOM_STEP: f64 = 0.1;
pub const ZOOM_MIN: f64 = 0.8;
pub const ZOOM_MAX: f64 = 1.6;
pub const ZOOM_DEFAULT: f64 = 1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sidebar {
    #[default]
    Default,
    Hidden,
    Narrow,
    Wide,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vibrancy {
    None,
    #[default]
    Sidebar,
    Full,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmojiStyle {
    #[serde(rename = "native")]
    Native,
    #[default]
    #[serde(rename = "facebook-3-0")]
    Facebook30,
    #[serde(rename = "messenger-1-0")]
    Messenger10,
    #[serde(rename = "facebook-2-2")]
    Facebook22,
}

/// Beacon categories the request filter can suppress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockPrefs {
    pub typing_indicator: bool,
    pub chat_seen: bool,
    pub delivery_receipt: bool,
}

/// The full preference set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub last_window_state: WindowState,
    pub use_work_chat: bool,
    pub theme: Theme,
    pub sidebar: Sidebar,
    pub vibrancy: Vibrancy,
    pub private_mode: bool,
    pub zoom_factor: f64,
    pub autoplay_videos: bool,
    pub emoji_style: EmojiStyle,
    pub show_message_buttons: bool,
    pub show_unread_badge: bool,
    pub flash_window_on_message: bool,
    pub bounce_dock_on_message: bool,
    pub notifications_muted: bool,
    pub notification_message_preview: bool,
    pub call_ringtone_muted: bool,
    pub block: BlockPrefs,
    pub quit_on_window_close: bool,
    pub launch_minimized: bool,
    pub launch_at_login: bool,
    pub show_tray_icon: bool,
    pub always_on_top: bool,
    /// Ask before pinning the window on top
    pub show_always_on_top_prompt: bool,
    pub auto_hide_menu_bar: bool,
    pub hardware_acceleration: bool,
    pub use_proxy: bool,
    pub proxy_address: String,
    pub auto_update: bool,
    pub is_spell_checker_enabled: bool,
    pub keep_me_signed_in: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            last_window_state: WindowState::default(),
            use_work_chat: false,
            theme: Theme::System,
            sidebar: Sidebar::Default,
            vibrancy: Vibrancy::Sidebar,
            private_mode: false,
            zoom_factor: ZOOM_DEFAULT,
            autoplay_videos: true,
            emoji_style: EmojiStyle::Facebook30,
            show_message_buttons: true,
            show_unread_badge: true,
            flash_window_on_message: true,
            bounce_dock_on_message: false,
            notifications_muted: false,
            notification_message_preview: true,
            call_ringtone_muted: false,
            block: BlockPrefs::default(),
            quit_on_window_close: false,
            launch_minimized: false,
            launch_at_login: false,
            show_tray_icon: true,
            always_on_top: false,
            show_always_on_top_prompt: true,
            auto_hide_menu_bar: false,
            hardware_acceleration: true,
            use_proxy: false,
            proxy_address: String::new(),
            auto_update: true,
            is_spell_checker_enabled: true,
            keep_me_signed_in: true,
        }
    }
}

/// Boolean preferences that menus and the page can flip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolPref {
    UseWorkChat,
    PrivateMode,
    AutoplayVideos,
    ShowMessageButtons,
    ShowUnreadBadge,
    FlashWindowOnMessage,
    BounceDockOnMessage,
    NotificationsMuted,
    NotificationMessagePreview,
    CallRingtoneMuted,
    BlockTypingIndicator,
    BlockChatSeen,
    BlockDeliveryReceipt,
    QuitOnWindowClose,
    LaunchMinimized,
    LaunchAtLogin,
    ShowTrayIcon,
    AlwaysOnTop,
    AutoHideMenuBar,
    HardwareAcceleration,
    UseProxy,
    AutoUpdate,
    SpellChecker,
    KeepMeSignedIn,
}

impl BoolPref {
    /// Dotted key as stored on disk
    pub fn key(&self) -> &'static str {
        match self {
            BoolPref::UseWorkChat => "useWorkChat",
            BoolPref::PrivateMode => "privateMode",
            BoolPref::AutoplayVideos => "autoplayVideos",
            BoolPref::ShowMessageButtons => "showMessageButtons",
            BoolPref::ShowUnreadBadge => "showUnreadBadge",
            BoolPref::FlashWindowOnMessage => "flashWindowOnMessage",
            BoolPref::BounceDockOnMessage => "bounceDockOnMessage",
            BoolPref::NotificationsMuted => "notificationsMuted",
            BoolPref::NotificationMessagePreview => "notificationMessagePreview",
            BoolPref::CallRingtoneMuted => "callRingtoneMuted",
            BoolPref::BlockTypingIndicator => "block.typingIndicator",
            BoolPref::BlockChatSeen => "block.chatSeen",
            BoolPref::BlockDeliveryReceipt => "block.deliveryReceipt",
            BoolPref::QuitOnWindowClose => "quitOnWindowClose",
            BoolPref::LaunchMinimized => "launchMinimized",
            BoolPref::LaunchAtLogin => "launchAtLogin",
            BoolPref::ShowTrayIcon => "showTrayIcon",
            BoolPref::AlwaysOnTop => "alwaysOnTop",
            BoolPref::AutoHideMenuBar => "autoHideMenuBar",
            BoolPref::HardwareAcceleration => "hardwareAcceleration",
            BoolPref::UseProxy => "useProxy",
            BoolPref::AutoUpdate => "autoUpdate",
            BoolPref::SpellChecker => "isSpellCheckerEnabled",
            BoolPref::KeepMeSignedIn => "keepMeSignedIn",
        }
    }
}

impl Preferences {
    pub fn get(&self, pref: BoolPref) -> bool {
        *self.slot(pref)
    }

    pub fn set(&mut self, pref: BoolPref, value: bool) {
        *self.slot_mut(pref) = value;
    }

    fn slot(&self, pref: BoolPref) -> &bool {
        match pref {
            BoolPref::UseWorkChat => &self.use_work_chat,
            BoolPref::PrivateMode => &self.private_mode,
            BoolPref::AutoplayVideos => &self.autoplay_videos,
            BoolPref::ShowMessageButtons => &self.show_message_buttons,
            BoolPref::ShowUnreadBadge => &self.show_unread_badge,
            BoolPref::FlashWindowOnMessage => &self.flash_window_on_message,
            BoolPref::BounceDockOnMessage => &self.bounce_dock_on_message,
            BoolPref::NotificationsMuted => &self.notifications_muted,
            BoolPref::NotificationMessagePreview => &self.notification_message_preview,
            BoolPref::CallRingtoneMuted => &self.call_ringtone_muted,
            BoolPref::BlockTypingIndicator => &self.block.typing_indicator,
            BoolPref::BlockChatSeen => &self.block.chat_seen,
            BoolPref::BlockDeliveryReceipt => &self.block.delivery_receipt,
            BoolPref::QuitOnWindowClose => &self.quit_on_window_close,
            BoolPref::LaunchMinimized => &self.launch_minimized,
            BoolPref::LaunchAtLogin => &self.launch_at_login,
            BoolPref::ShowTrayIcon => &self.show_tray_icon,
            BoolPref::AlwaysOnTop => &self.always_on_top,
            BoolPref::AutoHideMenuBar => &self.auto_hide_menu_bar,
            BoolPref::HardwareAcceleration => &self.hardware_acceleration,
            BoolPref::UseProxy => &self.use_proxy,
            BoolPref::AutoUpdate => &self.auto_update,
            BoolPref::SpellChecker => &self.is_spell_checker_enabled,
            BoolPref::KeepMeSignedIn => &self.keep_me_signed_in,
        }
    }

    fn slot_mut(&mut self, pref: BoolPref) -> &mut bool {
        match pref {
            BoolPref::UseWorkChat => &mut self.use_work_chat,
            BoolPref::PrivateMode => &mut self.private_mode,
            BoolPref::AutoplayVideos => &mut self.autoplay_videos,
            BoolPref::ShowMessageButtons => &mut self.show_message_buttons,
            BoolPref::ShowUnreadBadge => &mut self.show_unread_badge,
            BoolPref::FlashWindowOnMessage => &mut self.flash_window_on_message,
            BoolPref::BounceDockOnMessage => &mut self.bounce_dock_on_message,
            BoolPref::NotificationsMuted => &mut self.notifications_muted,
            BoolPref::NotificationMessagePreview => &mut self.notification_message_preview,
            BoolPref::CallRingtoneMuted => &mut self.call_ringtone_muted,
            BoolPref::BlockTypingIndicator => &mut self.block.typing_indicator,
            BoolPref::BlockChatSeen => &mut self.block.chat_seen,
            BoolPref::BlockDeliveryReceipt => &mut self.block.delivery_receipt,
            BoolPref::QuitOnWindowClose => &mut self.quit_on_window_close,
            BoolPref::LaunchMinimized => &mut self.launch_minimized,
            BoolPref::LaunchAtLogin => &mut self.launch_at_login,
            BoolPref::ShowTrayIcon => &mut self.show_tray_icon,
            BoolPref::AlwaysOnTop => &mut self.always_on_top,
            BoolPref::AutoHideMenuBar => &mut self.auto_hide_menu_bar,
            BoolPref::HardwareAcceleration => &mut self.hardware_acceleration,
            BoolPref::UseProxy => &mut self.use_proxy,
            BoolPref::AutoUpdate => &mut self.auto_update,
            BoolPref::SpellChecker => &mut self.is_spell_checker_enabled,
            BoolPref::KeepMeSignedIn => &mut self.keep_me_signed_in,
        }
    }
}

/// Preference set bound to its file on disk
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    prefs: Preferences,
}

impl PreferenceStore {
    /// Load preferences, falling back to defaults when the file is missing or unreadable
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let prefs = match std::fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(prefs) => prefs,
                Err(e) => {
                    log::warn!("Preferences at {:?} are corrupt, using defaults: {}", path, e);
                    Preferences::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Preferences::default(),
            Err(e) => {
                log::warn!("Failed to read preferences at {:?}: {}", path, e);
                Preferences::default()
            }
        };

        Self { path, prefs }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> &Preferences {
        &self.prefs
    }

    /// Write the current set to disk
    pub fn save(&self) -> ChatwaveResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.prefs)
            .map_err(|e| ChatwaveError::preference(format!("Failed to serialize: {}", e)))?;

        // Write-then-rename so a crash never leaves a truncated file behind
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply a mutation and flush it. Returns whether anything changed.
    ///
    /// A failed write restores the previous values, so memory never runs ahead of the file.
    pub fn update<F>(&mut self, mutate: F) -> ChatwaveResult<bool>
    where
        F: FnOnce(&mut Preferences),
    {
        let before = self.prefs.clone();
        mutate(&mut self.prefs);
        if self.prefs == before {
            return Ok(false);
        }
        if let Err(e) = self.save() {
            self.prefs = before;
            return Err(e);
        }
        Ok(true)
    }

    pub fn set_bool(&mut self, pref: BoolPref, value: bool) -> ChatwaveResult<bool> {
        self.update(|p| p.set(pref, value))
    }

    /// Flip a boolean preference and return its new value
    pub fn toggle(&mut self, pref: BoolPref) -> ChatwaveResult<bool> {
        let value = !self.prefs.get(pref);
        self.set_bool(pref, value)?;
        Ok(value)
    }

    /// Reset everything to defaults
    pub fn clear(&mut self) -> ChatwaveResult<()> {
        let before = std::mem::take(&mut self.prefs);
        if let Err(e) = self.save() {
            self.prefs = before;
            return Err(e);
        }
        Ok(())
    }

    /// Record normal bounds, keeping the maximized flag as it is
    pub fn set_window_bounds(&mut self, bounds: Bounds) -> ChatwaveResult<bool> {
        self.update(|p| {
            let is_maximized = p.last_window_state.is_maximized;
            p.last_window_state = bounds.to_state(is_maximized);
        })
    }

    pub fn set_maximized(&mut self, maximized: bool) -> ChatwaveResult<bool> {
        self.update(|p| p.last_window_state.is_maximized = maximized)
    }

    /// Read a value by dotted key such as `block.chatSeen`
    pub fn get_value(&self, key: &str) -> Option<Value> {
        let tree = serde_json::to_value(&self.prefs).ok()?;
        tree.pointer(&json_pointer(key)).cloned()
    }

    pub fn zoom_in(&mut self) -> ChatwaveResult<f64> {
        self.set_zoom(self.prefs.zoom_factor + ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> ChatwaveResult<f64> {
        self.set_zoom(self.prefs.zoom_factor - ZOOM_STEP)
    }

    pub fn zoom_reset(&mut self) -> ChatwaveResult<f64> {
        self.set_zoom(ZOOM_DEFAULT)
    }

    /// Set the zoom factor, clamped to the supported range; returns the applied value
    pub fn set_zoom(&mut self, factor: f64) -> ChatwaveResult<f64> {
        let factor = clamp_zoom(factor);
        self.update(|p| p.zoom_factor = factor)?;
        Ok(factor)
    }
}

/// Clamp to the zoom range, snapping to one decimal so repeated steps never drift
pub fn clamp_zoom(factor: f64) -> f64 {
    if !factor.is_finite() {
        return ZOOM_DEFAULT;
    }
    ((factor * 10.0).round() / 10.0).clamp(ZOOM_MIN, ZOOM_MAX)
}

fn json_pointer(key: &str) -> String {
    key.split('.').fold(String::new(), |mut acc, part| {
        acc.push('/');
        acc.push_str(part);
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, PreferenceStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::load(dir.path().join("config.json"));
        (dir, store)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let (_dir, store) = store();
        assert_eq!(store.get(), &Preferences::default());
        assert_eq!(store.get().theme, Theme::System);
        assert_eq!(store.get().vibrancy, Vibrancy::Sidebar);
        assert!(store.get().show_unread_badge);
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = PreferenceStore::load(&path);
        assert_eq!(store.get(), &Preferences::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"theme":"dark","block":{"chatSeen":true},"someRetiredKey":1}"#,
        )
        .unwrap();

        let store = PreferenceStore::load(&path);
        assert_eq!(store.get().theme, Theme::Dark);
        assert!(store.get().block.chat_seen);
        assert!(!store.get().block.typing_indicator);
        assert!(store.get().auto_update);
    }

    #[test]
    fn test_mutation_is_flushed() {
        let (_dir, mut store) = store();
        assert!(store.toggle(BoolPref::BlockTypingIndicator).unwrap());

        let reloaded = PreferenceStore::load(store.path());
        assert!(reloaded.get().block.typing_indicator);
    }

    #[test]
    fn test_unchanged_update_reports_no_change() {
        let (_dir, mut store) = store();
        assert!(!store.update(|p| p.theme = Theme::System).unwrap());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_clear_resets() {
        let (_dir, mut store) = store();
        store.update(|p| p.sidebar = Sidebar::Wide).unwrap();
        store.clear().unwrap();

        assert_eq!(store.get().sidebar, Sidebar::Default);
        assert_eq!(PreferenceStore::load(store.path()).get(), &Preferences::default());
    }

    #[test]
    fn test_serialized_names() {
        let mut prefs = Preferences::default();
        prefs.emoji_style = EmojiStyle::Messenger10;
        let json = serde_json::to_value(&prefs).unwrap();

        assert_eq!(json["emojiStyle"], "messenger-1-0");
        assert_eq!(json["isSpellCheckerEnabled"], true);
        assert_eq!(json["block"]["deliveryReceipt"], false);
        assert_eq!(json["lastWindowState"]["isMaximized"], false);
    }

    #[test]
    fn test_dotted_get_value() {
        let (_dir, mut store) = store();
        store.set_bool(BoolPref::BlockChatSeen, true).unwrap();

        assert_eq!(store.get_value("block.chatSeen"), Some(json!(true)));
        assert_eq!(store.get_value("theme"), Some(json!("system")));
        assert_eq!(store.get_value("nope"), None);
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the data directory should be makes every write fail
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let mut store = PreferenceStore::load(blocker.join("config.json"));

        assert!(store.set_bool(BoolPref::PrivateMode, true).is_err());
        assert!(!store.get().private_mode);

        assert!(store.set_zoom(1.5).is_err());
        assert_eq!(store.get().zoom_factor, ZOOM_DEFAULT);
    }

    #[test]
    fn test_failed_clear_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut store = PreferenceStore::load(&path);
        store.update(|p| p.sidebar = Sidebar::Wide).unwrap();

        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        store.path = blocker.join("config.json");

        assert!(store.clear().is_err());
        assert_eq!(store.get().sidebar, Sidebar::Wide);
    }

    #[test]
    fn test_bool_pref_keys_resolve() {
        let (_dir, store) = store();
        let all = [
            BoolPref::UseWorkChat,
            BoolPref::BlockTypingIndicator,
            BoolPref::BlockChatSeen,
            BoolPref::BlockDeliveryReceipt,
            BoolPref::SpellChecker,
            BoolPref::KeepMeSignedIn,
            BoolPref::HardwareAcceleration,
        ];
        for pref in all {
            assert_eq!(
                store.get_value(pref.key()),
                Some(json!(store.get().get(pref))),
                "key {}",
                pref.key()
            );
        }
    }

    #[test]
    fn test_zoom_is_clamped() {
        let (_dir, mut store) = store();
        for _ in 0..10 {
            store.zoom_in().unwrap();
        }
        assert_eq!(store.get().zoom_factor, ZOOM_MAX);

        for _ in 0..10 {
            store.zoom_out().unwrap();
        }
        assert_eq!(store.get().zoom_factor, ZOOM_MIN);

        assert_eq!(store.zoom_reset().unwrap(), 1.0);
        assert_eq!(store.zoom_in().unwrap(), 1.1);
    }

    #[test]
    fn test_window_bounds_keep_maximized_flag() {
        let (_dir, mut store) = store();
        store.set_maximized(true).unwrap();
        store.set_window_bounds(Bounds::new(1, 2, 900, 700)).unwrap();

        let state = store.get().last_window_state;
        assert!(state.is_maximized);
        assert_eq!((state.x, state.width), (Some(1), 900));
    }
}
