//! Menu command execution
//!
//! `run_command` applies a menu command to the preference store and returns the effects the
//! event loop must carry out. Confirmation prompts go through the `Confirmer` trait so that the
//! decline path can be tested without a modal dialog.

use crate::ipc::PageMessage;
use crate::menu::{AppCommand, AuxWindow, ConfirmAction, MenuCommand};
use chatwave_core::config::{APP_NAME, REPOSITORY_URL};
use chatwave_core::prefs::{BoolPref, PreferenceStore, Sidebar};
use chatwave_core::ChatwaveResult;
use serde_json::json;
use tracing::{debug, info};

/// A yes/no question shown before a disruptive action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub title: String,
    pub message: String,
}

impl Prompt {
    fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    fn relaunch() -> Self {
        Self::new(
            "Relaunch Confirmation",
            format!("Are you sure you want to relaunch {}?", APP_NAME),
        )
    }

    fn restart(reason: &str) -> Self {
        Self::new(
            "Restart Required",
            format!("{} needs to be restarted to {}. Restart now?", APP_NAME, reason),
        )
    }
}

/// Asks the user to confirm a prompt
pub trait Confirmer {
    fn confirm(&self, prompt: &Prompt) -> bool;

    /// Offer up to three labelled answers; `None` when the dialog is dismissed
    fn choose(&self, prompt: &Prompt, answers: &[&str]) -> Option<usize>;

    /// Show a message with a single OK button
    fn inform(&self, prompt: &Prompt);
}

/// Modal native dialog
pub struct DialogConfirmer;

impl Confirmer for DialogConfirmer {
    fn confirm(&self, prompt: &Prompt) -> bool {
        let result = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Info)
            .set_title(prompt.title.as_str())
            .set_description(prompt.message.as_str())
            .set_buttons(rfd::MessageButtons::YesNo)
            .show();
        matches!(result, rfd::MessageDialogResult::Yes)
    }

    fn choose(&self, prompt: &Prompt, answers: &[&str]) -> Option<usize> {
        let buttons = match answers {
            [yes, no] => rfd::MessageButtons::OkCancelCustom(yes.to_string(), no.to_string()),
            [yes, no, cancel] => rfd::MessageButtons::YesNoCancelCustom(
                yes.to_string(),
                no.to_string(),
                cancel.to_string(),
            ),
            _ => return None,
        };
        let result = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Warning)
            .set_title(prompt.title.as_str())
            .set_description(prompt.message.as_str())
            .set_buttons(buttons)
            .show();

        // Some backends report custom buttons by position instead of label
        match result {
            rfd::MessageDialogResult::Custom(label) => answers.iter().position(|a| *a == label),
            rfd::MessageDialogResult::Yes | rfd::MessageDialogResult::Ok => Some(0),
            rfd::MessageDialogResult::No => Some(1),
            rfd::MessageDialogResult::Cancel if answers.len() == 3 => Some(2),
            rfd::MessageDialogResult::Cancel => Some(1),
        }
    }

    fn inform(&self, prompt: &Prompt) {
        let _ = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Info)
            .set_title(prompt.title.as_str())
            .set_description(prompt.message.as_str())
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

const ON_TOP_ANSWERS: [&str; 3] = [
    "Display on Top",
    "Don't Display on Top",
    "Display on Top, Don't Ask Again",
];

/// Work the event loop must do after a command ran
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Page(PageMessage),
    AlwaysOnTop(bool),
    MenuBarVisible(bool),
    /// Register or unregister the app as a login item
    LaunchAtLogin(bool),
    /// Apply a zoom factor to the main webview
    Zoom(f64),
    RefreshBadge,
    RefreshTray,
    OpenWindow(AuxWindow),
    OpenUrl(String),
    App(AppCommand),
    Relaunch,
    /// Remove the data directory, then relaunch
    WipeAndRelaunch,
}

/// Run a menu command against the preference store
///
/// Preferences are read after any prompt returns, and a declined prompt changes nothing.
pub fn run_command(
    command: MenuCommand,
    prefs: &mut PreferenceStore,
    confirmer: &dyn Confirmer,
) -> ChatwaveResult<Vec<Effect>> {
    debug!("Running menu command {:?}", command);

    let effects = match command {
        MenuCommand::TogglePref(pref) => toggle_pref(pref, prefs, confirmer)?,
        MenuCommand::SetTheme(theme) => {
            prefs.update(|p| p.theme = theme)?;
            vec![Effect::Page(PageMessage::new("set-theme", json!({ "theme": theme })))]
        }
        MenuCommand::SetSidebar(sidebar) => set_sidebar(sidebar, prefs)?,
        MenuCommand::ToggleHiddenSidebar => {
            let sidebar = if prefs.get().sidebar == Sidebar::Hidden {
                Sidebar::Default
            } else {
                Sidebar::Hidden
            };
            set_sidebar(sidebar, prefs)?
        }
        MenuCommand::SetVibrancy(vibrancy) => {
            prefs.update(|p| p.vibrancy = vibrancy)?;
            vec![Effect::Page(PageMessage::new(
                "update-vibrancy",
                json!({ "vibrancy": vibrancy }),
            ))]
        }
        MenuCommand::PageAction(action) => vec![Effect::Page(PageMessage::bare(action))],
        MenuCommand::OpenWindow(window) => vec![Effect::OpenWindow(window)],
        MenuCommand::OpenUrl(url) => vec![Effect::OpenUrl(url.to_string())],
        MenuCommand::Confirm(action) => confirm_action(action, prefs, confirmer)?,
        MenuCommand::App(AppCommand::ZoomIn) => zoom("zoom-in", prefs.zoom_in()?),
        MenuCommand::App(AppCommand::ZoomOut) => zoom("zoom-out", prefs.zoom_out()?),
        MenuCommand::App(AppCommand::ZoomReset) => zoom("zoom-reset", prefs.zoom_reset()?),
        MenuCommand::App(command) => vec![Effect::App(command)],
    };

    Ok(effects)
}

fn zoom(action: &'static str, factor: f64) -> Vec<Effect> {
    vec![
        Effect::Zoom(factor),
        Effect::Page(PageMessage::new(action, json!({ "zoomFactor": factor }))),
    ]
}

fn set_sidebar(sidebar: Sidebar, prefs: &mut PreferenceStore) -> ChatwaveResult<Vec<Effect>> {
    prefs.update(|p| p.sidebar = sidebar)?;
    Ok(vec![Effect::Page(PageMessage::new(
        "update-sidebar",
        json!({ "sidebar": sidebar }),
    ))])
}

fn toggle_pref(
    pref: BoolPref,
    prefs: &mut PreferenceStore,
    confirmer: &dyn Confirmer,
) -> ChatwaveResult<Vec<Effect>> {
    if pref == BoolPref::AlwaysOnTop {
        return toggle_always_on_top(prefs, confirmer);
    }

    let value = prefs.toggle(pref)?;
    info!("{} is now {}", pref.key(), value);

    let page = |name, payload| vec![Effect::Page(PageMessage::new(name, payload))];

    let effects = match pref {
        BoolPref::PrivateMode => page("set-private-mode", json!({ "enabled": value })),
        BoolPref::AutoplayVideos => page("toggle-video-autoplay", json!({ "enabled": value })),
        BoolPref::ShowMessageButtons => page("toggle-message-buttons", json!({ "enabled": value })),
        BoolPref::NotificationsMuted => vec![
            Effect::Page(PageMessage::new(
                "toggle-mute-notifications",
                json!({ "muted": value }),
            )),
            Effect::RefreshTray,
        ],
        BoolPref::ShowUnreadBadge | BoolPref::FlashWindowOnMessage | BoolPref::BounceDockOnMessage => {
            vec![Effect::RefreshBadge]
        }
        BoolPref::AutoHideMenuBar => {
            if value {
                confirmer.inform(&Prompt::new(
                    "Menu Bar Hidden",
                    "Press the Alt key to toggle the menu bar.",
                ));
            }
            vec![Effect::MenuBarVisible(!value)]
        }
        BoolPref::ShowTrayIcon | BoolPref::LaunchMinimized => vec![Effect::RefreshTray],
        BoolPref::LaunchAtLogin => vec![Effect::LaunchAtLogin(value)],
        BoolPref::SpellChecker => restart(confirmer, "enable or disable the spell checker"),
        BoolPref::HardwareAcceleration => restart(confirmer, "change hardware acceleration"),
        _ => Vec::new(),
    };

    Ok(effects)
}

// Turning it off never asks. Turning it on asks until the user opts out of the question.
fn toggle_always_on_top(
    prefs: &mut PreferenceStore,
    confirmer: &dyn Confirmer,
) -> ChatwaveResult<Vec<Effect>> {
    let current = prefs.get();
    if !current.always_on_top && current.show_always_on_top_prompt {
        let prompt = Prompt::new(
            "Always on Top",
            "Are you sure you want the window to stay on top of other windows?",
        );
        match confirmer.choose(&prompt, &ON_TOP_ANSWERS) {
            Some(0) => {}
            Some(2) => {
                prefs.update(|p| p.show_always_on_top_prompt = false)?;
            }
            _ => {
                debug!("Always on top declined");
                return Ok(Vec::new());
            }
        }
    }

    let value = prefs.toggle(BoolPref::AlwaysOnTop)?;
    info!("{} is now {}", BoolPref::AlwaysOnTop.key(), value);
    Ok(vec![Effect::AlwaysOnTop(value)])
}

// The preference is kept either way; declining only postpones the restart
fn restart(confirmer: &dyn Confirmer, reason: &str) -> Vec<Effect> {
    if confirmer.confirm(&Prompt::restart(reason)) {
        vec![Effect::Relaunch]
    } else {
        Vec::new()
    }
}

fn confirm_action(
    action: ConfirmAction,
    prefs: &mut PreferenceStore,
    confirmer: &dyn Confirmer,
) -> ChatwaveResult<Vec<Effect>> {
    let prompt = match action {
        ConfirmAction::SwitchToWorkChat => Prompt::new(
            "Switch to Work Chat",
            format!("{} will relaunch and open Work Chat. Continue?", APP_NAME),
        ),
        ConfirmAction::SwitchToMessenger => Prompt::new(
            "Switch to Messenger",
            format!("{} will relaunch and open Messenger. Continue?", APP_NAME),
        ),
        ConfirmAction::DeleteSettings => Prompt::new(
            "Delete Settings",
            format!(
                "All {} settings will be reset to their defaults and the app will relaunch. Continue?",
                APP_NAME
            ),
        ),
        ConfirmAction::DeleteAppData => Prompt::new(
            "Delete App Data",
            format!(
                "All {} data, including your login session, will be deleted and the app will relaunch. Continue?",
                APP_NAME
            ),
        ),
        ConfirmAction::Relaunch => Prompt::relaunch(),
    };

    if !confirmer.confirm(&prompt) {
        debug!("{:?} declined", action);
        return Ok(Vec::new());
    }

    let effects = match action {
        ConfirmAction::SwitchToWorkChat => {
            prefs.set_bool(BoolPref::UseWorkChat, true)?;
            vec![Effect::Relaunch]
        }
        ConfirmAction::SwitchToMessenger => {
            prefs.set_bool(BoolPref::UseWorkChat, false)?;
            vec![Effect::Relaunch]
        }
        ConfirmAction::DeleteSettings => {
            prefs.clear()?;
            vec![Effect::Relaunch]
        }
        ConfirmAction::DeleteAppData => vec![Effect::WipeAndRelaunch],
        ConfirmAction::Relaunch => vec![Effect::Relaunch],
    };
    Ok(effects)
}

/// Prompt shown when the proxy settings window closes after a change
pub fn proxy_relaunch_prompt() -> Prompt {
    Prompt::new(
        "Proxy Settings",
        format!("{} needs to relaunch to apply the proxy settings. Relaunch now?", APP_NAME),
    )
}

/// Debug block appended to new issue reports
pub fn debug_info(webview_version: &str) -> String {
    format!(
        "{} {}\n{} {}\nWebview {}",
        APP_NAME,
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
        webview_version
    )
}

/// New-issue URL with the debug block prefilled
pub fn report_issue_url(debug_info: &str) -> String {
    let body = format!("<!-- Please succinctly describe your issue and steps to reproduce it. -->\n\n---\n\n{}", debug_info);
    format!(
        "{}/issues/new?body={}",
        REPOSITORY_URL,
        urlencoding::encode(&body)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::build_menu;
    use chatwave_core::prefs::{Theme, Vibrancy};
    use chatwave_core::types::Platform;
    use std::cell::RefCell;

    struct FakeConfirmer {
        answer: bool,
        choice: Option<usize>,
        asked: RefCell<Vec<Prompt>>,
        told: RefCell<Vec<Prompt>>,
    }

    impl FakeConfirmer {
        fn new(answer: bool) -> Self {
            Self {
                answer,
                choice: if answer { Some(0) } else { Some(1) },
                asked: RefCell::new(Vec::new()),
                told: RefCell::new(Vec::new()),
            }
        }

        fn choosing(choice: Option<usize>) -> Self {
            Self {
                choice,
                ..Self::new(false)
            }
        }
    }

    impl Confirmer for FakeConfirmer {
        fn confirm(&self, prompt: &Prompt) -> bool {
            self.asked.borrow_mut().push(prompt.clone());
            self.answer
        }

        fn choose(&self, prompt: &Prompt, _answers: &[&str]) -> Option<usize> {
            self.asked.borrow_mut().push(prompt.clone());
            self.choice
        }

        fn inform(&self, prompt: &Prompt) {
            self.told.borrow_mut().push(prompt.clone());
        }
    }

    fn store() -> (tempfile::TempDir, PreferenceStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::load(dir.path().join("config.json"));
        (dir, store)
    }

    #[test]
    fn test_toggle_private_mode_notifies_page() {
        let (_dir, mut prefs) = store();
        let yes = FakeConfirmer::new(true);

        let effects =
            run_command(MenuCommand::TogglePref(BoolPref::PrivateMode), &mut prefs, &yes).unwrap();

        assert!(prefs.get().private_mode);
        assert_eq!(
            effects,
            vec![Effect::Page(PageMessage::new(
                "set-private-mode",
                json!({ "enabled": true })
            ))]
        );
        assert!(yes.asked.borrow().is_empty());
    }

    #[test]
    fn test_toggle_persists_to_disk() {
        let (dir, mut prefs) = store();
        run_command(
            MenuCommand::TogglePref(BoolPref::BlockTypingIndicator),
            &mut prefs,
            &FakeConfirmer::new(true),
        )
        .unwrap();

        let reloaded = PreferenceStore::load(dir.path().join("config.json"));
        assert!(reloaded.get().block.typing_indicator);
    }

    #[test]
    fn test_theme_and_vibrancy_messages() {
        let (_dir, mut prefs) = store();
        let yes = FakeConfirmer::new(true);

        let effects = run_command(MenuCommand::SetTheme(Theme::Dark), &mut prefs, &yes).unwrap();
        assert_eq!(prefs.get().theme, Theme::Dark);
        assert_eq!(
            effects,
            vec![Effect::Page(PageMessage::new("set-theme", json!({ "theme": "dark" })))]
        );

        let effects = run_command(MenuCommand::SetVibrancy(Vibrancy::Full), &mut prefs, &yes).unwrap();
        assert_eq!(
            effects,
            vec![Effect::Page(PageMessage::new(
                "update-vibrancy",
                json!({ "vibrancy": "full" })
            ))]
        );
    }

    #[test]
    fn test_hidden_sidebar_toggles_back_to_default() {
        let (_dir, mut prefs) = store();
        let yes = FakeConfirmer::new(true);

        run_command(MenuCommand::ToggleHiddenSidebar, &mut prefs, &yes).unwrap();
        assert_eq!(prefs.get().sidebar, Sidebar::Hidden);

        let effects = run_command(MenuCommand::ToggleHiddenSidebar, &mut prefs, &yes).unwrap();
        assert_eq!(prefs.get().sidebar, Sidebar::Default);
        assert_eq!(
            effects,
            vec![Effect::Page(PageMessage::new(
                "update-sidebar",
                json!({ "sidebar": "default" })
            ))]
        );
    }

    #[test]
    fn test_declined_switch_changes_nothing() {
        let (_dir, mut prefs) = store();
        let before = prefs.get().clone();
        let menu_before = build_menu(prefs.get(), Platform::Linux);
        let no = FakeConfirmer::new(false);

        for action in [
            ConfirmAction::SwitchToWorkChat,
            ConfirmAction::DeleteSettings,
            ConfirmAction::DeleteAppData,
            ConfirmAction::Relaunch,
        ] {
            let effects = run_command(MenuCommand::Confirm(action), &mut prefs, &no).unwrap();
            assert!(effects.is_empty());
        }

        assert_eq!(prefs.get(), &before);
        assert_eq!(build_menu(prefs.get(), Platform::Linux), menu_before);
        assert_eq!(no.asked.borrow().len(), 4);
    }

    #[test]
    fn test_confirmed_switch_relaunches() {
        let (_dir, mut prefs) = store();
        let effects = run_command(
            MenuCommand::Confirm(ConfirmAction::SwitchToWorkChat),
            &mut prefs,
            &FakeConfirmer::new(true),
        )
        .unwrap();

        assert!(prefs.get().use_work_chat);
        assert_eq!(effects, vec![Effect::Relaunch]);
    }

    #[test]
    fn test_delete_settings_resets_preferences() {
        let (_dir, mut prefs) = store();
        prefs.set_bool(BoolPref::PrivateMode, true).unwrap();

        let effects = run_command(
            MenuCommand::Confirm(ConfirmAction::DeleteSettings),
            &mut prefs,
            &FakeConfirmer::new(true),
        )
        .unwrap();

        assert!(!prefs.get().private_mode);
        assert_eq!(effects, vec![Effect::Relaunch]);
    }

    #[test]
    fn test_delete_app_data_wipes() {
        let (_dir, mut prefs) = store();
        let effects = run_command(
            MenuCommand::Confirm(ConfirmAction::DeleteAppData),
            &mut prefs,
            &FakeConfirmer::new(true),
        )
        .unwrap();
        assert_eq!(effects, vec![Effect::WipeAndRelaunch]);
    }

    #[test]
    fn test_spell_checker_prompts_for_restart() {
        let (_dir, mut prefs) = store();

        let no = FakeConfirmer::new(false);
        let effects =
            run_command(MenuCommand::TogglePref(BoolPref::SpellChecker), &mut prefs, &no).unwrap();
        assert!(effects.is_empty());
        assert!(!prefs.get().is_spell_checker_enabled);
        assert!(no.asked.borrow()[0].message.contains("spell checker"));

        let yes = FakeConfirmer::new(true);
        let effects = run_command(
            MenuCommand::TogglePref(BoolPref::HardwareAcceleration),
            &mut prefs,
            &yes,
        )
        .unwrap();
        assert_eq!(effects, vec![Effect::Relaunch]);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let (_dir, mut prefs) = store();
        let yes = FakeConfirmer::new(true);

        let mut last = Vec::new();
        for _ in 0..10 {
            last = run_command(MenuCommand::App(AppCommand::ZoomIn), &mut prefs, &yes).unwrap();
        }
        assert_eq!(prefs.get().zoom_factor, 1.6);
        assert_eq!(last[0], Effect::Zoom(1.6));

        let effects = run_command(MenuCommand::App(AppCommand::ZoomReset), &mut prefs, &yes).unwrap();
        assert_eq!(effects[0], Effect::Zoom(1.0));
    }

    #[test]
    fn test_window_preferences_map_to_effects() {
        let (_dir, mut prefs) = store();
        let yes = FakeConfirmer::new(true);

        let effects =
            run_command(MenuCommand::TogglePref(BoolPref::AlwaysOnTop), &mut prefs, &yes).unwrap();
        assert_eq!(effects, vec![Effect::AlwaysOnTop(true)]);

        let effects =
            run_command(MenuCommand::TogglePref(BoolPref::AutoHideMenuBar), &mut prefs, &yes).unwrap();
        assert_eq!(effects, vec![Effect::MenuBarVisible(false)]);

        let effects =
            run_command(MenuCommand::TogglePref(BoolPref::NotificationsMuted), &mut prefs, &yes)
                .unwrap();
        assert!(effects.contains(&Effect::RefreshTray));

        let effects =
            run_command(MenuCommand::TogglePref(BoolPref::LaunchAtLogin), &mut prefs, &yes).unwrap();
        assert_eq!(effects, vec![Effect::LaunchAtLogin(true)]);
    }

    #[test]
    fn test_auto_hide_menu_bar_explains_alt_key() {
        let (_dir, mut prefs) = store();
        let yes = FakeConfirmer::new(true);

        run_command(MenuCommand::TogglePref(BoolPref::AutoHideMenuBar), &mut prefs, &yes).unwrap();
        assert_eq!(yes.told.borrow().len(), 1);
        assert!(yes.told.borrow()[0].message.contains("Alt key"));

        // Showing the menu bar again needs no explanation
        let effects =
            run_command(MenuCommand::TogglePref(BoolPref::AutoHideMenuBar), &mut prefs, &yes).unwrap();
        assert_eq!(effects, vec![Effect::MenuBarVisible(true)]);
        assert_eq!(yes.told.borrow().len(), 1);
    }

    #[test]
    fn test_always_on_top_declined() {
        let (_dir, mut prefs) = store();
        let no = FakeConfirmer::new(false);

        let effects =
            run_command(MenuCommand::TogglePref(BoolPref::AlwaysOnTop), &mut prefs, &no).unwrap();
        assert!(effects.is_empty());
        assert!(!prefs.get().always_on_top);
        assert!(prefs.get().show_always_on_top_prompt);

        let dismissed = FakeConfirmer::choosing(None);
        run_command(MenuCommand::TogglePref(BoolPref::AlwaysOnTop), &mut prefs, &dismissed).unwrap();
        assert!(!prefs.get().always_on_top);
    }

    #[test]
    fn test_always_on_top_dont_ask_again() {
        let (_dir, mut prefs) = store();
        let opt_out = FakeConfirmer::choosing(Some(2));

        let effects =
            run_command(MenuCommand::TogglePref(BoolPref::AlwaysOnTop), &mut prefs, &opt_out).unwrap();
        assert_eq!(effects, vec![Effect::AlwaysOnTop(true)]);
        assert!(!prefs.get().show_always_on_top_prompt);

        // Off, then on again without a question
        let quiet = FakeConfirmer::choosing(Some(1));
        run_command(MenuCommand::TogglePref(BoolPref::AlwaysOnTop), &mut prefs, &quiet).unwrap();
        let effects =
            run_command(MenuCommand::TogglePref(BoolPref::AlwaysOnTop), &mut prefs, &quiet).unwrap();
        assert_eq!(effects, vec![Effect::AlwaysOnTop(true)]);
        assert!(quiet.asked.borrow().is_empty());
    }

    #[test]
    fn test_pass_through_commands() {
        let (_dir, mut prefs) = store();
        let yes = FakeConfirmer::new(true);

        assert_eq!(
            run_command(MenuCommand::PageAction("new-room"), &mut prefs, &yes).unwrap(),
            vec![Effect::Page(PageMessage::bare("new-room"))]
        );
        assert_eq!(
            run_command(MenuCommand::App(AppCommand::Reload), &mut prefs, &yes).unwrap(),
            vec![Effect::App(AppCommand::Reload)]
        );
        assert_eq!(
            run_command(MenuCommand::OpenWindow(AuxWindow::Versions), &mut prefs, &yes).unwrap(),
            vec![Effect::OpenWindow(AuxWindow::Versions)]
        );
    }

    #[test]
    fn test_report_issue_url() {
        let url = report_issue_url(&debug_info("1.0"));
        assert!(url.starts_with(REPOSITORY_URL));
        assert!(url.contains("/issues/new?body="));
        assert!(!url.contains(' '));
        assert!(url.contains(std::env::consts::OS));
    }
}
