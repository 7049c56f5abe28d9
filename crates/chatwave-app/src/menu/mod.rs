//! Application menu
//!
//! `build_menu` assembles a platform-free description of the menu bar from the current
//! preferences. The renderer turns that tree into muda items, so every check item is derived
//! from the preference store and never the other way around.

pub mod render;

use chatwave_core::config::{APP_NAME, DONATE_URL, REPOSITORY_URL, WEBSITE_URL};
use chatwave_core::prefs::{BoolPref, Preferences, Sidebar, Theme, Vibrancy};
use chatwave_core::types::Platform;

/// Items provided by the OS menu implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeItem {
    Undo,
    Redo,
    Cut,
    Copy,
    Paste,
    SelectAll,
    CloseWindow,
    About,
    Services,
    Hide,
    HideOthers,
    ShowAll,
    Minimize,
    Maximize,
    Fullscreen,
    BringAllToFront,
}

/// Auxiliary windows opened from the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuxWindow {
    ProxySettings,
    Versions,
}

/// Actions that must be confirmed before anything changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    SwitchToWorkChat,
    SwitchToMessenger,
    DeleteSettings,
    DeleteAppData,
    Relaunch,
}

/// Actions carried out by the application against its windows and files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    GoBack,
    GoForward,
    CloseWindow,
    Reload,
    ForceReload,
    ZoomIn,
    ZoomOut,
    ZoomReset,
    CustomStyles,
    ShowSettingsFile,
    ShowAppData,
    ToggleDevTools,
    ReportIssue,
    Quit,
}

/// What selecting a menu item does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    TogglePref(BoolPref),
    SetTheme(Theme),
    SetSidebar(Sidebar),
    ToggleHiddenSidebar,
    SetVibrancy(Vibrancy),
    /// Forward an action to the page
    PageAction(&'static str),
    OpenWindow(AuxWindow),
    Confirm(ConfirmAction),
    App(AppCommand),
    OpenUrl(&'static str),
}

impl MenuCommand {
    /// Check state of this command under `prefs`, or `None` for plain items
    pub fn checked_state(&self, prefs: &Preferences) -> Option<bool> {
        match *self {
            MenuCommand::TogglePref(pref) => Some(prefs.get(pref)),
            MenuCommand::SetTheme(theme) => Some(prefs.theme == theme),
            MenuCommand::SetSidebar(sidebar) => Some(prefs.sidebar == sidebar),
            MenuCommand::ToggleHiddenSidebar => Some(prefs.sidebar == Sidebar::Hidden),
            MenuCommand::SetVibrancy(vibrancy) => Some(prefs.vibrancy == vibrancy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuNode {
    Submenu {
        label: String,
        enabled: bool,
        children: Vec<MenuNode>,
    },
    Item {
        label: String,
        accelerator: Option<&'static str>,
        enabled: bool,
        command: MenuCommand,
    },
    Check {
        label: String,
        accelerator: Option<&'static str>,
        enabled: bool,
        checked: bool,
        command: MenuCommand,
    },
    Separator,
    Native(NativeItem),
}

impl MenuNode {
    fn same_shape(&self, other: &MenuNode) -> bool {
        match (self, other) {
            (
                MenuNode::Submenu {
                    label: a,
                    enabled: ea,
                    children: ca,
                },
                MenuNode::Submenu {
                    label: b,
                    enabled: eb,
                    children: cb,
                },
            ) => {
                a == b
                    && ea == eb
                    && ca.len() == cb.len()
                    && ca.iter().zip(cb).all(|(x, y)| x.same_shape(y))
            }
            (
                MenuNode::Check {
                    label: a,
                    accelerator: aa,
                    enabled: ea,
                    command: ca,
                    ..
                },
                MenuNode::Check {
                    label: b,
                    accelerator: ab,
                    enabled: eb,
                    command: cb,
                    ..
                },
            ) => a == b && aa == ab && ea == eb && ca == cb,
            _ => self == other,
        }
    }
}

/// The whole menu bar: one submenu per top-level entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuTree {
    pub menus: Vec<MenuNode>,
}

impl MenuTree {
    /// Equal apart from check states
    pub fn same_structure(&self, other: &MenuTree) -> bool {
        self.menus.len() == other.menus.len()
            && self.menus.iter().zip(&other.menus).all(|(a, b)| a.same_shape(b))
    }

    /// Every actionable leaf, depth first
    pub fn leaves(&self) -> Vec<&MenuNode> {
        fn walk<'a>(nodes: &'a [MenuNode], out: &mut Vec<&'a MenuNode>) {
            for node in nodes {
                match node {
                    MenuNode::Submenu { children, .. } => walk(children, out),
                    MenuNode::Item { .. } | MenuNode::Check { .. } => out.push(node),
                    _ => {}
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.menus, &mut out);
        out
    }

    pub fn commands(&self) -> Vec<MenuCommand> {
        self.leaves()
            .into_iter()
            .filter_map(|node| match node {
                MenuNode::Item { command, .. } | MenuNode::Check { command, .. } => Some(*command),
                _ => None,
            })
            .collect()
    }
}

fn submenu(label: impl Into<String>, children: Vec<MenuNode>) -> MenuNode {
    MenuNode::Submenu {
        label: label.into(),
        enabled: true,
        children,
    }
}

fn item(label: impl Into<String>, accelerator: Option<&'static str>, command: MenuCommand) -> MenuNode {
    MenuNode::Item {
        label: label.into(),
        accelerator,
        enabled: true,
        command,
    }
}

fn page(label: &str, accelerator: Option<&'static str>, action: &'static str) -> MenuNode {
    item(label, accelerator, MenuCommand::PageAction(action))
}

fn app(label: &str, accelerator: Option<&'static str>, command: AppCommand) -> MenuNode {
    item(label, accelerator, MenuCommand::App(command))
}

struct Assembler<'a> {
    prefs: &'a Preferences,
    platform: Platform,
}

impl Assembler<'_> {
    fn check(&self, label: &str, accelerator: Option<&'static str>, command: MenuCommand) -> MenuNode {
        MenuNode::Check {
            label: label.to_string(),
            accelerator,
            enabled: true,
            checked: command.checked_state(self.prefs).unwrap_or(false),
            command,
        }
    }

    fn pref(&self, label: &str, pref: BoolPref) -> MenuNode {
        self.check(label, None, MenuCommand::TogglePref(pref))
    }

    fn preferences(&self) -> Vec<MenuNode> {
        let mac = self.platform.is_macos();

        let privacy = submenu(
            "Privacy",
            vec![
                self.pref("Block Seen Indicator", BoolPref::BlockChatSeen),
                self.pref("Block Typing Indicator", BoolPref::BlockTypingIndicator),
                self.pref("Block Delivery Receipts", BoolPref::BlockDeliveryReceipt),
            ],
        );

        let mut items = vec![privacy];
        if mac {
            items.push(self.pref("Bounce Dock on Message", BoolPref::BounceDockOnMessage));
        }
        items.extend([
            self.pref("Autoplay Videos", BoolPref::AutoplayVideos),
            self.pref(
                "Show Message Preview in Notifications",
                BoolPref::NotificationMessagePreview,
            ),
            self.pref("Mute Notifications", BoolPref::NotificationsMuted),
            self.pref("Mute Call Ringtone", BoolPref::CallRingtoneMuted),
            self.pref("Show Unread Badge", BoolPref::ShowUnreadBadge),
            self.pref("Spell Checker", BoolPref::SpellChecker),
            self.pref("Hardware Acceleration", BoolPref::HardwareAcceleration),
            self.check(
                "Always on Top",
                Some("CmdOrCtrl+Shift+T"),
                MenuCommand::TogglePref(BoolPref::AlwaysOnTop),
            ),
        ]);
        if self.platform != Platform::Linux {
            items.push(self.pref("Launch at Login", BoolPref::LaunchAtLogin));
        }
        if !mac {
            items.push(self.pref("Auto Hide Menu Bar", BoolPref::AutoHideMenuBar));
        }
        items.push(self.pref("Automatic Updates", BoolPref::AutoUpdate));
        items.push(self.pref("Flash Window on Message", BoolPref::FlashWindowOnMessage));
        if !mac {
            let mut tray = self.pref("Show Tray Icon", BoolPref::ShowTrayIcon);
            if let MenuNode::Check { enabled, .. } = &mut tray {
                *enabled = !self.prefs.launch_minimized;
            }
            items.push(tray);
            items.push(self.pref("Launch Minimized", BoolPref::LaunchMinimized));
        }
        items.push(self.pref("Quit on Window Close", BoolPref::QuitOnWindowClose));
        items.push(MenuNode::Separator);
        items.push(submenu(
            "Advanced",
            vec![
                app("Custom Styles", None, AppCommand::CustomStyles),
                item(
                    "Proxy Settings",
                    None,
                    MenuCommand::OpenWindow(AuxWindow::ProxySettings),
                ),
            ],
        ));
        items
    }

    fn switch_items(&self) -> Vec<MenuNode> {
        let switch = if self.prefs.use_work_chat {
            item(
                "Switch to Messenger…",
                Some("CmdOrCtrl+Shift+1"),
                MenuCommand::Confirm(ConfirmAction::SwitchToMessenger),
            )
        } else {
            item(
                "Switch to Work Chat…",
                Some("CmdOrCtrl+Shift+2"),
                MenuCommand::Confirm(ConfirmAction::SwitchToWorkChat),
            )
        };
        vec![switch, page("Log Out", None, "log-out")]
    }

    fn relaunch(&self) -> MenuNode {
        item(
            format!("Relaunch {}", APP_NAME),
            None,
            MenuCommand::Confirm(ConfirmAction::Relaunch),
        )
    }

    fn quit(&self) -> MenuNode {
        app(&format!("Quit {}", APP_NAME), Some("CmdOrCtrl+Q"), AppCommand::Quit)
    }

    fn new_chat_items(&self) -> Vec<MenuNode> {
        vec![
            page("New Conversation", Some("CmdOrCtrl+N"), "new-conversation"),
            page("New Room", Some("CmdOrCtrl+O"), "new-room"),
        ]
    }

    fn edit(&self) -> MenuNode {
        submenu(
            "Edit",
            vec![
                MenuNode::Native(NativeItem::Undo),
                MenuNode::Native(NativeItem::Redo),
                MenuNode::Separator,
                MenuNode::Native(NativeItem::Cut),
                MenuNode::Native(NativeItem::Copy),
                MenuNode::Native(NativeItem::Paste),
                MenuNode::Separator,
                MenuNode::Native(NativeItem::SelectAll),
            ],
        )
    }

    fn view(&self) -> MenuNode {
        let theme = submenu(
            "Theme",
            vec![
                self.check("Follow System Appearance", None, MenuCommand::SetTheme(Theme::System)),
                self.check("Light Mode", None, MenuCommand::SetTheme(Theme::Light)),
                self.check("Dark Mode", None, MenuCommand::SetTheme(Theme::Dark)),
            ],
        );

        let sidebar = submenu(
            "Sidebar",
            vec![
                self.check("Adaptive Sidebar", None, MenuCommand::SetSidebar(Sidebar::Default)),
                self.check(
                    "Hide Sidebar",
                    Some("CmdOrCtrl+Shift+S"),
                    MenuCommand::ToggleHiddenSidebar,
                ),
                self.check("Narrow Sidebar", None, MenuCommand::SetSidebar(Sidebar::Narrow)),
                self.check("Wide Sidebar", None, MenuCommand::SetSidebar(Sidebar::Wide)),
            ],
        );

        let mut items = vec![
            app("Go Back", Some("Alt+Left"), AppCommand::GoBack),
            app("Go Forward", Some("Alt+Right"), AppCommand::GoForward),
            app("Close Window", Some("CmdOrCtrl+W"), AppCommand::CloseWindow),
            app("Reload", Some("CmdOrCtrl+R"), AppCommand::Reload),
            app("Force Reload", Some("CmdOrCtrl+Shift+R"), AppCommand::ForceReload),
            MenuNode::Separator,
            app("Reset Text Size", Some("CmdOrCtrl+0"), AppCommand::ZoomReset),
            app("Increase Text Size", Some("CmdOrCtrl+="), AppCommand::ZoomIn),
            app("Decrease Text Size", Some("CmdOrCtrl+-"), AppCommand::ZoomOut),
            MenuNode::Separator,
            theme,
        ];

        if self.platform.is_macos() {
            items.push(submenu(
                "Vibrancy",
                vec![
                    self.check("No Vibrancy", None, MenuCommand::SetVibrancy(Vibrancy::None)),
                    self.check(
                        "Sidebar-only Vibrancy",
                        None,
                        MenuCommand::SetVibrancy(Vibrancy::Sidebar),
                    ),
                    self.check(
                        "Full-window Vibrancy",
                        None,
                        MenuCommand::SetVibrancy(Vibrancy::Full),
                    ),
                ],
            ));
        }

        items.extend([
            MenuNode::Separator,
            self.check(
                "Hide Names and Avatars",
                Some("CmdOrCtrl+Shift+N"),
                MenuCommand::TogglePref(BoolPref::PrivateMode),
            ),
            MenuNode::Separator,
            sidebar,
            self.pref("Show Message Buttons", BoolPref::ShowMessageButtons),
            MenuNode::Separator,
            page("Show Main Chats", None, "show-chats-view"),
            page("Show Marketplace Chats", None, "show-marketplace-view"),
            page("Show Message Requests", None, "show-requests-view"),
            page("Show Archived Chats", None, "show-archive-view"),
        ]);

        submenu("View", items)
    }

    fn conversation(&self) -> MenuNode {
        submenu(
            "Conversation",
            vec![
                page("Mute Conversation", Some("CmdOrCtrl+Shift+M"), "mute-conversation"),
                page("Archive Conversation", Some("CmdOrCtrl+Shift+H"), "archive-conversation"),
                page("Delete Conversation", Some("CmdOrCtrl+Shift+D"), "delete-conversation"),
                MenuNode::Separator,
                page("Select Next Conversation", Some("Control+Tab"), "next-conversation"),
                page(
                    "Select Previous Conversation",
                    Some("Control+Shift+Tab"),
                    "previous-conversation",
                ),
                page("Find Conversation", Some("CmdOrCtrl+K"), "find"),
                page("Search in Conversation", Some("CmdOrCtrl+F"), "search"),
                MenuNode::Separator,
                page("Insert GIF", Some("CmdOrCtrl+G"), "insert-gif"),
                page("Insert Sticker", Some("CmdOrCtrl+S"), "insert-sticker"),
                page("Insert Emoji", Some("CmdOrCtrl+E"), "insert-emoji"),
                page("Attach Files", Some("CmdOrCtrl+T"), "attach-files"),
                page("Focus Text Input", Some("CmdOrCtrl+I"), "focus-text-input"),
            ],
        )
    }

    fn debug(&self) -> MenuNode {
        let devtools = if self.platform.is_macos() {
            "Alt+Command+I"
        } else {
            "Ctrl+Shift+I"
        };

        submenu(
            "Debug",
            vec![
                app("Show Settings", None, AppCommand::ShowSettingsFile),
                app("Show App Data", None, AppCommand::ShowAppData),
                MenuNode::Separator,
                item(
                    "Delete Settings",
                    None,
                    MenuCommand::Confirm(ConfirmAction::DeleteSettings),
                ),
                item(
                    "Delete App Data",
                    None,
                    MenuCommand::Confirm(ConfirmAction::DeleteAppData),
                ),
                MenuNode::Separator,
                app("Toggle Developer Tools", Some(devtools), AppCommand::ToggleDevTools),
            ],
        )
    }

    fn help(&self) -> MenuNode {
        let mut items = vec![
            item("Website", None, MenuCommand::OpenUrl(WEBSITE_URL)),
            item("Source Code", None, MenuCommand::OpenUrl(REPOSITORY_URL)),
            item("Donate…", None, MenuCommand::OpenUrl(DONATE_URL)),
            app("Report an Issue…", None, AppCommand::ReportIssue),
            MenuNode::Separator,
            item("Show Versions", None, MenuCommand::OpenWindow(AuxWindow::Versions)),
        ];
        // The macOS app menu carries About instead
        if !self.platform.is_macos() {
            items.push(MenuNode::Native(NativeItem::About));
        }
        submenu("Help", items)
    }

    fn macos_template(&self) -> Vec<MenuNode> {
        let mut app_menu = vec![
            MenuNode::Native(NativeItem::About),
            MenuNode::Separator,
            submenu(format!("{} Preferences", APP_NAME), self.preferences()),
            page("Messenger Preferences…", Some("Command+,"), "show-preferences"),
            MenuNode::Separator,
        ];
        app_menu.extend(self.switch_items());
        app_menu.extend([
            MenuNode::Separator,
            self.relaunch(),
            MenuNode::Separator,
            MenuNode::Native(NativeItem::Services),
            MenuNode::Separator,
            MenuNode::Native(NativeItem::Hide),
            MenuNode::Native(NativeItem::HideOthers),
            MenuNode::Native(NativeItem::ShowAll),
            MenuNode::Separator,
            self.quit(),
        ]);

        let mut file = self.new_chat_items();
        file.extend([MenuNode::Separator, MenuNode::Native(NativeItem::CloseWindow)]);

        vec![
            submenu(APP_NAME, app_menu),
            submenu("File", file),
            self.edit(),
            self.view(),
            self.conversation(),
            submenu(
                "Window",
                vec![
                    MenuNode::Native(NativeItem::Minimize),
                    MenuNode::Native(NativeItem::Maximize),
                    MenuNode::Native(NativeItem::Fullscreen),
                    MenuNode::Separator,
                    MenuNode::Native(NativeItem::BringAllToFront),
                ],
            ),
            self.debug(),
            self.help(),
        ]
    }

    fn default_template(&self) -> Vec<MenuNode> {
        let mut file = self.new_chat_items();
        file.extend([
            MenuNode::Separator,
            submenu(format!("{} Settings", APP_NAME), self.preferences()),
            page("Messenger Settings", Some("Control+,"), "show-preferences"),
            MenuNode::Separator,
        ]);
        file.extend(self.switch_items());
        file.extend([MenuNode::Separator, self.relaunch(), self.quit()]);

        vec![
            submenu(APP_NAME, file),
            self.edit(),
            self.view(),
            self.conversation(),
            self.debug(),
            self.help(),
        ]
    }
}

/// Assemble the menu bar for `platform` from the current preferences
pub fn build_menu(prefs: &Preferences, platform: Platform) -> MenuTree {
    let assembler = Assembler { prefs, platform };
    let menus = if platform.is_macos() {
        assembler.macos_template()
    } else {
        assembler.default_template()
    };
    MenuTree { menus }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const PLATFORMS: [Platform; 3] = [Platform::MacOs, Platform::Linux, Platform::Windows];

    fn assert_checks_match(tree: &MenuTree, prefs: &Preferences) {
        for node in tree.leaves() {
            if let MenuNode::Check {
                label,
                checked,
                command,
                ..
            } = node
            {
                assert_eq!(
                    Some(*checked),
                    command.checked_state(prefs),
                    "check state of {:?}",
                    label
                );
            }
        }
    }

    fn find<'a>(tree: &'a MenuTree, wanted: &str) -> Option<&'a MenuNode> {
        tree.leaves().into_iter().find(|node| match node {
            MenuNode::Item { label, .. } | MenuNode::Check { label, .. } => label == wanted,
            _ => false,
        })
    }

    #[test]
    fn test_checks_follow_preferences() {
        let mut prefs = Preferences::default();
        for platform in PLATFORMS {
            assert_checks_match(&build_menu(&prefs, platform), &prefs);
        }

        prefs.theme = Theme::Dark;
        prefs.sidebar = Sidebar::Hidden;
        prefs.vibrancy = Vibrancy::Full;
        prefs.block.chat_seen = true;
        prefs.private_mode = true;
        prefs.notifications_muted = true;
        prefs.auto_update = false;
        for platform in PLATFORMS {
            assert_checks_match(&build_menu(&prefs, platform), &prefs);
        }
    }

    #[test]
    fn test_every_bool_toggle_reassembles_consistently() {
        let tree = build_menu(&Preferences::default(), Platform::Linux);
        for command in tree.commands() {
            if let MenuCommand::TogglePref(pref) = command {
                let mut prefs = Preferences::default();
                prefs.set(pref, !prefs.get(pref));
                assert_checks_match(&build_menu(&prefs, Platform::Linux), &prefs);
            }
        }
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let prefs = Preferences::default();
        for platform in PLATFORMS {
            assert_eq!(build_menu(&prefs, platform), build_menu(&prefs, platform));
        }
    }

    #[test]
    fn test_check_changes_keep_structure() {
        let before = build_menu(&Preferences::default(), Platform::Windows);
        let prefs = Preferences {
            theme: Theme::Light,
            call_ringtone_muted: true,
            ..Default::default()
        };
        let after = build_menu(&prefs, Platform::Windows);

        assert_ne!(before, after);
        assert!(before.same_structure(&after));
    }

    #[test]
    fn test_switch_item_changes_structure() {
        let before = build_menu(&Preferences::default(), Platform::Linux);
        let prefs = Preferences {
            use_work_chat: true,
            ..Default::default()
        };
        let after = build_menu(&prefs, Platform::Linux);

        assert!(!before.same_structure(&after));
        assert!(find(&after, "Switch to Messenger…").is_some());
        assert!(find(&after, "Switch to Work Chat…").is_none());
    }

    #[test]
    fn test_platforms_expose_same_actions() {
        let prefs = Preferences::default();
        let mac_only = |c: &MenuCommand| {
            matches!(
                c,
                MenuCommand::SetVibrancy(_) | MenuCommand::TogglePref(BoolPref::BounceDockOnMessage)
            )
        };
        let others_only = |c: &MenuCommand| {
            matches!(
                c,
                MenuCommand::TogglePref(
                    BoolPref::AutoHideMenuBar | BoolPref::ShowTrayIcon | BoolPref::LaunchMinimized
                )
            )
        };

        let login = MenuCommand::TogglePref(BoolPref::LaunchAtLogin);

        let mac: Vec<_> = build_menu(&prefs, Platform::MacOs)
            .commands()
            .into_iter()
            .filter(|c| !mac_only(c) && *c != login)
            .collect();
        let linux: Vec<_> = build_menu(&prefs, Platform::Linux)
            .commands()
            .into_iter()
            .filter(|c| !others_only(c))
            .collect();

        assert!(mac.iter().all(|c| linux.contains(c)), "missing on Linux");
        assert!(linux.iter().all(|c| mac.contains(c)), "missing on macOS");

        let windows: Vec<_> = build_menu(&prefs, Platform::Windows)
            .commands()
            .into_iter()
            .filter(|c| *c != login)
            .collect();
        assert_eq!(build_menu(&prefs, Platform::Linux).commands(), windows);
    }

    #[test]
    fn test_launch_at_login_hidden_on_linux() {
        let prefs = Preferences::default();
        assert!(find(&build_menu(&prefs, Platform::Linux), "Launch at Login").is_none());
        for platform in [Platform::MacOs, Platform::Windows] {
            match find(&build_menu(&prefs, platform), "Launch at Login") {
                Some(MenuNode::Check { command, .. }) => {
                    assert_eq!(*command, MenuCommand::TogglePref(BoolPref::LaunchAtLogin))
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_tray_toggle_disabled_while_launch_minimized() {
        let prefs = Preferences {
            launch_minimized: true,
            ..Default::default()
        };
        let tree = build_menu(&prefs, Platform::Windows);
        match find(&tree, "Show Tray Icon") {
            Some(MenuNode::Check { enabled, .. }) => assert!(!enabled),
            other => panic!("unexpected {:?}", other),
        }
        assert!(find(&build_menu(&prefs, Platform::MacOs), "Show Tray Icon").is_none());
    }

    #[test]
    fn test_confirmation_routed_items() {
        let tree = build_menu(&Preferences::default(), Platform::Linux);
        for label in ["Delete Settings", "Delete App Data", "Relaunch Chatwave", "Switch to Work Chat…"] {
            match find(&tree, label) {
                Some(MenuNode::Item {
                    command: MenuCommand::Confirm(_),
                    ..
                }) => {}
                other => panic!("{} is {:?}", label, other),
            }
        }
    }

    #[test]
    fn test_accelerators_parse() {
        for platform in PLATFORMS {
            for node in build_menu(&Preferences::default(), platform).leaves() {
                let accelerator = match node {
                    MenuNode::Item { accelerator, .. } | MenuNode::Check { accelerator, .. } => *accelerator,
                    _ => None,
                };
                if let Some(accelerator) = accelerator {
                    assert!(
                        muda::accelerator::Accelerator::from_str(accelerator).is_ok(),
                        "{} does not parse",
                        accelerator
                    );
                }
            }
        }
    }
}
