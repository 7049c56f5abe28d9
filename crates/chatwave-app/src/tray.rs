//! System tray icon
//!
//! The tray carries the unread decoration, a Show/Hide toggle, the notification mute switch and
//! the conversation list reported by the page. The mute switch and conversation list also make up
//! the macOS dock menu; both menus share item ids so selections land in `TrayCommand`.

use crate::badge;
use crate::icons;
use chatwave_core::config::APP_NAME;
use chatwave_core::prefs::Preferences;
use chatwave_core::types::{Conversation, Platform};
use chatwave_core::{ChatwaveError, ChatwaveResult};
use tray_icon::menu::{CheckMenuItem, IsMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem};
use tray_icon::{TrayIcon, TrayIconBuilder};
use tracing::{debug, warn};

const ID_TOGGLE: &str = "tray-toggle";
const ID_MUTE: &str = "tray-mute";
const ID_QUIT: &str = "tray-quit";
const CONVERSATION_PREFIX: &str = "tray-conversation-";

/// Longest conversation label shown in the menu
const MAX_LABEL_CHARS: usize = 40;

/// Tray menu selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    ToggleWindow,
    ToggleMute,
    /// Zero-based index into the reported conversations
    JumpTo(usize),
    Quit,
}

impl TrayCommand {
    /// Map a menu id back to a tray command; ids that belong to the menu bar return `None`
    pub fn from_id(id: &MenuId) -> Option<Self> {
        match id.as_ref() {
            ID_TOGGLE => Some(TrayCommand::ToggleWindow),
            ID_MUTE => Some(TrayCommand::ToggleMute),
            ID_QUIT => Some(TrayCommand::Quit),
            other => other
                .strip_prefix(CONVERSATION_PREFIX)
                .and_then(|index| index.parse().ok())
                .map(TrayCommand::JumpTo),
        }
    }
}

/// Whether the tray icon should exist
pub fn tray_wanted(platform: Platform, prefs: &Preferences) -> bool {
    !platform.is_macos() && (prefs.show_tray_icon || prefs.launch_minimized)
}

/// Menu label for a conversation, unread ones marked and long names cut short
pub fn conversation_label(conversation: &Conversation) -> String {
    let mut label: String = conversation.label.chars().take(MAX_LABEL_CHARS).collect();
    if conversation.label.chars().count() > MAX_LABEL_CHARS {
        label.push('…');
    }
    if conversation.unread {
        format!("● {}", label)
    } else {
        label
    }
}

/// Entry shared by the tray menu and the dock menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickItem {
    Mute { checked: bool },
    Separator,
    Conversation { index: usize, label: String },
}

/// Mute switch followed by the reported conversations
pub fn quick_items(muted: bool, conversations: &[Conversation]) -> Vec<QuickItem> {
    let mut items = vec![QuickItem::Mute { checked: muted }];
    if !conversations.is_empty() {
        items.push(QuickItem::Separator);
        items.extend(
            conversations
                .iter()
                .enumerate()
                .map(|(index, conversation)| QuickItem::Conversation {
                    index,
                    label: conversation_label(conversation),
                }),
        );
    }
    items
}

/// Dock menu for macOS; the system appends its own window list and Quit
pub fn build_dock_menu(muted: bool, conversations: &[Conversation]) -> Menu {
    let items: Vec<Box<dyn IsMenuItem>> = quick_items(muted, conversations)
        .iter()
        .map(native_quick_item)
        .collect();
    menu_from(&items)
}

pub struct Tray {
    icon: TrayIcon,
    unread: bool,
}

impl Tray {
    pub fn new(window_visible: bool, prefs: &Preferences, conversations: &[Conversation], count: u32) -> ChatwaveResult<Self> {
        let unread = prefs.show_unread_badge && count > 0;
        let mut builder = TrayIconBuilder::new()
            .with_tooltip(badge::tooltip(APP_NAME, count))
            .with_menu(Box::new(build_menu(window_visible, prefs.notifications_muted, conversations)))
            .with_menu_on_left_click(false);

        if let Some(icon) = icons::create_tray_icon(unread) {
            builder = builder.with_icon(icon);
        }

        let icon = builder
            .build()
            .map_err(|e| ChatwaveError::window(format!("Failed to create tray icon: {}", e)))?;

        debug!("Tray icon created");
        Ok(Self { icon, unread })
    }

    /// Rebuild the context menu
    pub fn update_menu(&self, window_visible: bool, muted: bool, conversations: &[Conversation]) {
        self.icon
            .set_menu(Some(Box::new(build_menu(window_visible, muted, conversations))));
    }

    pub fn set_unread(&mut self, unread: bool) {
        if self.unread == unread {
            return;
        }
        self.unread = unread;
        if let Err(e) = self.icon.set_icon(icons::create_tray_icon(unread)) {
            warn!("Failed to update tray icon: {}", e);
        }
    }

    pub fn set_count(&self, count: u32) {
        if let Err(e) = self.icon.set_tooltip(Some(badge::tooltip(APP_NAME, count))) {
            warn!("Failed to update tray tooltip: {}", e);
        }
    }
}

fn build_menu(window_visible: bool, muted: bool, conversations: &[Conversation]) -> Menu {
    let toggle_label = if window_visible {
        format!("Hide {}", APP_NAME)
    } else {
        format!("Show {}", APP_NAME)
    };

    let mut items: Vec<Box<dyn IsMenuItem>> =
        vec![Box::new(MenuItem::with_id(ID_TOGGLE, toggle_label, true, None))];
    items.extend(quick_items(muted, conversations).iter().map(native_quick_item));
    items.push(Box::new(PredefinedMenuItem::separator()));
    items.push(Box::new(MenuItem::with_id(ID_QUIT, format!("Quit {}", APP_NAME), true, None)));

    menu_from(&items)
}

fn native_quick_item(item: &QuickItem) -> Box<dyn IsMenuItem> {
    match item {
        QuickItem::Mute { checked } => Box::new(CheckMenuItem::with_id(
            ID_MUTE,
            "Mute Notifications",
            true,
            *checked,
            None,
        )),
        QuickItem::Separator => Box::new(PredefinedMenuItem::separator()),
        QuickItem::Conversation { index, label } => Box::new(MenuItem::with_id(
            format!("{}{}", CONVERSATION_PREFIX, index),
            label,
            true,
            None,
        )),
    }
}

fn menu_from(items: &[Box<dyn IsMenuItem>]) -> Menu {
    let menu = Menu::new();
    for item in items {
        if let Err(e) = menu.append(item.as_ref()) {
            warn!("Failed to add menu item: {}", e);
        }
    }
    menu
}
