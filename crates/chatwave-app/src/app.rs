//! Event loop glue
//!
//! `App` owns the native windows, webviews and tray. It feeds events into the platform-free
//! state machines and applies whatever they decide back onto tao, wry and the OS.

use crate::badge::{BadgeActions, OverlayAction};
use crate::commands::{self, Confirmer, DialogConfirmer, Effect};
use crate::icons;
use crate::ipc::handler::{handle_message, Reply};
use crate::ipc::{IpcMessage, PageMessage, WindowRole, CALL_BRIDGE};
use crate::menu::render::MenuRenderer;
use crate::menu::{build_menu, AppCommand, AuxWindow, MenuCommand};
use crate::notifications::{NativeNotifier, NotificationAction};
use crate::platform::PlatformManager;
use crate::state::{AppState, ExitPlan};
use crate::tray::{self, Tray, TrayCommand};
use crate::updater;
use crate::webview::{
    build_webview, custom_css_script, eval_script, proxy_config, proxy_settings_html,
    versions_html, webview_version,
};
use crate::window::{LifecycleAction, LifecycleEvent};
use crate::UserEvent;
use chatwave_core::config::{user_agent, APP_NAME};
use chatwave_core::types::Bounds;
use chatwave_core::{BoolPref, ChatwaveError, ChatwaveResult};
use chatwave_shield::{evaluate_navigation, NavigationDecision};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use tao::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use tao::event::WindowEvent;
use tao::event_loop::{EventLoopProxy, EventLoopWindowTarget};
use tao::window::{UserAttentionType, Window, WindowBuilder, WindowId};
use tracing::{debug, error, info, warn};
use wry::{WebView, WebViewBuilder};

/// Forward IPC bodies from a webview into the event loop, tagged with the sender's role
pub fn ipc_forwarder(
    proxy: EventLoopProxy<UserEvent>,
    role: WindowRole,
) -> impl Fn(wry::http::Request<String>) + 'static {
    move |request| match serde_json::from_str::<IpcMessage>(request.body()) {
        Ok(message) => {
            let _ = proxy.send_event(UserEvent::Ipc { role, message });
        }
        Err(e) => warn!("Invalid IPC message from {:?} window: {}", role, e),
    }
}

/// Navigation handler that keeps Messenger in place and sends everything else to the browser
pub fn navigation_guard(proxy: EventLoopProxy<UserEvent>) -> impl Fn(String) -> bool + 'static {
    move |url| match evaluate_navigation(&url) {
        NavigationDecision::AllowInPlace => true,
        NavigationDecision::OpenExternally(target) => {
            let _ = proxy.send_event(UserEvent::OpenExternal(target));
            false
        }
        NavigationDecision::AllowRestrictedWindow | NavigationDecision::Deny => {
            debug!("Blocked navigation to {}", url);
            false
        }
    }
}

// Declared webview first so it drops before its window
struct AuxView {
    webview: WebView,
    window: Window,
    role: WindowRole,
}

pub struct App {
    state: AppState,
    webview: WebView,
    window: Window,
    aux: HashMap<WindowId, AuxView>,
    menu: MenuRenderer,
    tray: Option<Tray>,
    dock_menu: Option<muda::Menu>,
    notifier: NativeNotifier,
    platform: Box<dyn PlatformManager>,
    proxy: EventLoopProxy<UserEvent>,
    monitor_count: usize,
    exit_requested: bool,
}

impl App {
    pub fn new(
        state: AppState,
        window: Window,
        webview: WebView,
        menu: MenuRenderer,
        platform: Box<dyn PlatformManager>,
        proxy: EventLoopProxy<UserEvent>,
    ) -> Self {
        let notifier = NativeNotifier::new(
            proxy.clone(),
            state.paths.data_dir().join("notification-icons"),
        );
        let monitor_count = window.available_monitors().count();

        let mut app = Self {
            state,
            webview,
            window,
            aux: HashMap::new(),
            menu,
            tray: None,
            dock_menu: None,
            notifier,
            platform,
            proxy,
            monitor_count,
            exit_requested: false,
        };
        app.update_display_scales();
        app.sync_tray();
        app
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Close auxiliary windows and tear the state down
    pub fn shutdown(&mut self) -> ExitPlan {
        self.aux.clear();
        self.tray = None;
        if self.dock_menu.take().is_some() {
            self.platform.set_dock_menu(None);
        }
        self.notifier.clear_icons();
        self.state.teardown()
    }

    pub fn handle_user_event(&mut self, event: UserEvent, target: &EventLoopWindowTarget<UserEvent>) {
        match event {
            UserEvent::Ipc { role, message } => {
                let replies = handle_message(&mut self.state, role, message);
                self.apply_replies(replies, target);
            }
            UserEvent::Menu(id) => {
                if let Some(command) = TrayCommand::from_id(&id) {
                    self.run_tray_command(command, target);
                } else if let Some(command) = self.menu.command(&id) {
                    self.run_menu_command(command, target);
                } else {
                    debug!("No command for menu id {:?}", id);
                }
            }
            UserEvent::TrayClick => self.lifecycle(LifecycleEvent::ToggleVisibility, target),
            UserEvent::Notification(event) => {
                let activate = matches!(
                    event.action,
                    NotificationAction::Click | NotificationAction::Reply(_)
                );
                let id = event.id;
                if let Some(message) = self.state.notifications.dispatch(event) {
                    self.notifier.forget(id);
                    self.eval_page(&message);
                    if activate {
                        self.lifecycle(LifecycleEvent::ShowRequested, target);
                    }
                }
            }
            UserEvent::SecondInstance => {
                info!("Second instance started, showing the window");
                self.lifecycle(LifecycleEvent::SecondInstance, target);
            }
            UserEvent::PageLoaded => self.on_page_loaded(target),
            UserEvent::OpenExternal(url) => self.open_external(&url),
            UserEvent::DisplayTick => self.check_displays(target),
            UserEvent::DndChanged(dnd) => {
                debug!("Do not disturb is {}", if dnd { "on" } else { "off" });
                self.state.dnd = dnd;
            }
            UserEvent::UpdateTick => {
                if self.state.prefs.get().auto_update {
                    updater::check_in_background(self.proxy.clone());
                }
            }
            UserEvent::UpdateAvailable(update) => self.notifier.show_info(
                &format!("{} {} is available", APP_NAME, update.version),
                &format!("Download it from {}", update.url),
            ),
        }
    }

    pub fn handle_window_event(
        &mut self,
        window_id: WindowId,
        event: WindowEvent<'_>,
        target: &EventLoopWindowTarget<UserEvent>,
    ) {
        if window_id != self.window.id() {
            if matches!(event, WindowEvent::CloseRequested) {
                self.close_aux(window_id, target);
            }
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.lifecycle(LifecycleEvent::CloseRequested, target),
            WindowEvent::Resized(_) | WindowEvent::Moved(_) => {
                if let Some(event) = self.geometry_event() {
                    self.lifecycle(event, target);
                }
            }
            WindowEvent::Focused(focused) => self.lifecycle(LifecycleEvent::Focused(focused), target),
            WindowEvent::ScaleFactorChanged { .. } => self.update_display_scales(),
            _ => {}
        }
    }

    /// Dock icon clicked (macOS)
    pub fn handle_reopen(&mut self, target: &EventLoopWindowTarget<UserEvent>) {
        self.lifecycle(LifecycleEvent::ShowRequested, target);
    }

    // Lifecycle

    fn lifecycle(&mut self, event: LifecycleEvent, target: &EventLoopWindowTarget<UserEvent>) {
        let was_visible = self.state.lifecycle.is_visible();
        let actions = self.state.lifecycle.handle(event, self.state.prefs.get());
        self.apply_lifecycle(actions, target);

        if was_visible != self.state.lifecycle.is_visible() {
            self.sync_tray();
        }
    }

    fn geometry_event(&self) -> Option<LifecycleEvent> {
        let position = self.window.outer_position().ok()?;
        let size = self.window.inner_size();
        Some(LifecycleEvent::Geometry {
            bounds: Bounds::new(position.x, position.y, size.width, size.height),
            maximized: self.window.is_maximized(),
            minimized: self.window.is_minimized(),
            fullscreen: self.window.fullscreen().is_some(),
        })
    }

    fn apply_lifecycle(&mut self, actions: Vec<LifecycleAction>, target: &EventLoopWindowTarget<UserEvent>) {
        for action in actions {
            debug!("Window action {:?}", action);
            match action {
                LifecycleAction::ExitFullscreen => self.window.set_fullscreen(None),
                // Hidden windows lose focus on their own
                LifecycleAction::Blur => {}
                LifecycleAction::Hide => self.window.set_visible(false),
                LifecycleAction::HideApplication => self.hide_application(target),
                LifecycleAction::Show => self.window.set_visible(true),
                LifecycleAction::Restore => self.window.set_minimized(false),
                LifecycleAction::Focus => self.window.set_focus(),
                LifecycleAction::SetBounds(bounds) => {
                    self.window
                        .set_outer_position(PhysicalPosition::new(bounds.x, bounds.y));
                    self.window
                        .set_inner_size(PhysicalSize::new(bounds.width, bounds.height));
                }
                LifecycleAction::SetPosition { x, y } => {
                    self.window.set_outer_position(PhysicalPosition::new(x, y));
                }
                LifecycleAction::Maximize => self.window.set_maximized(true),
                LifecycleAction::Unmaximize => self.window.set_maximized(false),
                LifecycleAction::StopFlash => self.window.request_user_attention(None),
                LifecycleAction::SaveGeometry { bounds, maximized } => {
                    if let Some(bounds) = bounds {
                        if let Err(e) = self.state.prefs.set_window_bounds(bounds) {
                            warn!("Failed to save window bounds: {}", e);
                        }
                    }
                    if let Err(e) = self.state.prefs.set_maximized(maximized) {
                        warn!("Failed to save window state: {}", e);
                    }
                }
                LifecycleAction::Quit => {
                    info!("Quitting");
                    self.exit_requested = true;
                }
            }
        }
    }

    #[cfg(target_os = "macos")]
    fn hide_application(&self, target: &EventLoopWindowTarget<UserEvent>) {
        use tao::platform::macos::EventLoopWindowTargetExtMacOS;
        target.hide_application();
    }

    #[cfg(not(target_os = "macos"))]
    fn hide_application(&self, _target: &EventLoopWindowTarget<UserEvent>) {
        self.window.set_visible(false);
    }

    fn on_page_loaded(&mut self, target: &EventLoopWindowTarget<UserEvent>) {
        debug!("Main page loaded");

        if let Some(css) = self.state.paths.read_custom_css() {
            eval_script(&self.webview, &custom_css_script(&css));
        }

        let prefs = self.state.prefs.get();
        let mut messages = vec![
            PageMessage::new("set-theme", json!({ "theme": prefs.theme })),
            PageMessage::new("update-sidebar", json!({ "sidebar": prefs.sidebar })),
            PageMessage::new("set-private-mode", json!({ "enabled": prefs.private_mode })),
            PageMessage::new(
                "toggle-message-buttons",
                json!({ "enabled": prefs.show_message_buttons }),
            ),
            PageMessage::new(
                "toggle-video-autoplay",
                json!({ "enabled": prefs.autoplay_videos }),
            ),
            PageMessage::new(
                "toggle-mute-notifications",
                json!({ "muted": prefs.notifications_muted }),
            ),
        ];
        if self.state.platform.is_macos() {
            messages.push(PageMessage::new(
                "update-vibrancy",
                json!({ "vibrancy": prefs.vibrancy }),
            ));
        }
        let zoom = prefs.zoom_factor;

        for message in &messages {
            self.eval_page(message);
        }
        self.apply_zoom(zoom);

        let actions = self.state.lifecycle.initial_show(self.state.prefs.get());
        self.apply_lifecycle(actions, target);
        self.sync_tray();
    }

    // Commands

    fn run_menu_command(&mut self, command: MenuCommand, target: &EventLoopWindowTarget<UserEvent>) {
        match commands::run_command(command, &mut self.state.prefs, &DialogConfirmer) {
            Ok(effects) => self.apply_effects(effects, target),
            Err(e) => error!("Menu command {:?} failed: {}", command, e),
        }
        // Also reverts a check mark the OS flipped for a declined prompt
        self.refresh_menu();
    }

    fn run_tray_command(&mut self, command: TrayCommand, target: &EventLoopWindowTarget<UserEvent>) {
        match command {
            TrayCommand::ToggleWindow => self.lifecycle(LifecycleEvent::ToggleVisibility, target),
            TrayCommand::ToggleMute => {
                self.run_menu_command(MenuCommand::TogglePref(BoolPref::NotificationsMuted), target)
            }
            TrayCommand::JumpTo(index) => {
                self.lifecycle(LifecycleEvent::ShowRequested, target);
                self.eval_page(&PageMessage::new("jump-to-conversation", json!(index + 1)));
            }
            TrayCommand::Quit => self.lifecycle(LifecycleEvent::QuitRequested, target),
        }
    }

    fn apply_effects(&mut self, effects: Vec<Effect>, target: &EventLoopWindowTarget<UserEvent>) {
        for effect in effects {
            match effect {
                Effect::Page(message) => self.eval_page(&message),
                Effect::AlwaysOnTop(on) => self.window.set_always_on_top(on),
                Effect::MenuBarVisible(visible) => self.set_menu_bar_visible(visible),
                Effect::LaunchAtLogin(enabled) => self.set_launch_at_login(enabled),
                Effect::Zoom(factor) => self.apply_zoom(factor),
                Effect::RefreshBadge => {
                    let count = self.state.badge.count();
                    let actions = self
                        .state
                        .badge
                        .update(count, self.state.prefs.get(), self.state.dnd);
                    self.apply_badge(actions);
                }
                Effect::RefreshTray => self.sync_tray(),
                Effect::OpenWindow(window) => {
                    if let Err(e) = self.open_aux(window, target) {
                        error!("Failed to open {:?} window: {}", window, e);
                    }
                }
                Effect::OpenUrl(url) => self.open_external(&url),
                Effect::App(command) => self.run_app_command(command, target),
                Effect::Relaunch => {
                    self.state.request_relaunch(false);
                    self.lifecycle(LifecycleEvent::QuitRequested, target);
                }
                Effect::WipeAndRelaunch => {
                    self.state.request_relaunch(true);
                    self.lifecycle(LifecycleEvent::QuitRequested, target);
                }
            }
        }
    }

    fn run_app_command(&mut self, command: AppCommand, target: &EventLoopWindowTarget<UserEvent>) {
        match command {
            AppCommand::GoBack => eval_script(&self.webview, "window.history.back();"),
            AppCommand::GoForward => eval_script(&self.webview, "window.history.forward();"),
            AppCommand::CloseWindow => self.lifecycle(LifecycleEvent::CloseRequested, target),
            AppCommand::Reload => eval_script(&self.webview, "window.location.reload();"),
            AppCommand::ForceReload => {
                let url = self
                    .webview
                    .url()
                    .unwrap_or_else(|_| self.state.start_url().to_string());
                if let Err(e) = self.webview.load_url(&url) {
                    warn!("Failed to reload {}: {}", url, e);
                }
            }
            // Zoom commands resolve to effects in run_command
            AppCommand::ZoomIn | AppCommand::ZoomOut | AppCommand::ZoomReset => {}
            AppCommand::CustomStyles => match self.state.paths.ensure_custom_css() {
                Ok(path) => self.open_path(&path),
                Err(e) => error!("Failed to create custom stylesheet: {}", e),
            },
            AppCommand::ShowSettingsFile => {
                if let Err(e) = self.state.prefs.save() {
                    warn!("Failed to save preferences: {}", e);
                }
                let path = self.state.paths.config_file();
                self.open_path(&path);
            }
            AppCommand::ShowAppData => {
                let path = self.state.paths.data_dir().to_path_buf();
                self.open_path(&path);
            }
            AppCommand::ToggleDevTools => {
                if self.webview.is_devtools_open() {
                    self.webview.close_devtools();
                } else {
                    self.webview.open_devtools();
                }
            }
            AppCommand::ReportIssue => {
                let url = commands::report_issue_url(&commands::debug_info(&webview_version()));
                self.open_external(&url);
            }
            AppCommand::Quit => self.lifecycle(LifecycleEvent::QuitRequested, target),
        }
    }

    fn apply_replies(&mut self, replies: Vec<Reply>, target: &EventLoopWindowTarget<UserEvent>) {
        for reply in replies {
            match reply {
                Reply::Eval { role, script } => self.eval_in(role, &script),
                Reply::Badge(actions) => self.apply_badge(actions),
                Reply::OverlayIcon(data) => self.set_overlay(&data),
                Reply::Notify(prepared) => {
                    for id in self.state.notifications.drain_expired() {
                        self.notifier.forget(id);
                    }
                    self.notifier.show(&prepared);
                }
                Reply::OpenExternal(url) => self.open_external(&url),
                Reply::LoadMain(url) => {
                    if let Err(e) = self.webview.load_url(&url) {
                        warn!("Failed to load {}: {}", url, e);
                    }
                }
                Reply::OpenCallPopup(url) => {
                    if let Err(e) = self.open_call_popup(&url, target) {
                        error!("Failed to open call window: {}", e);
                    }
                }
                Reply::Lifecycle(event) => self.lifecycle(event, target),
                Reply::CloseWindow(role) => {
                    let ids: Vec<WindowId> = self
                        .aux
                        .iter()
                        .filter(|(_, view)| view.role == role)
                        .map(|(id, _)| *id)
                        .collect();
                    for id in ids {
                        self.close_aux(id, target);
                    }
                }
                Reply::RefreshMenu => self.refresh_menu(),
                Reply::RefreshTray => self.sync_tray(),
            }
        }
    }

    // Unread indicators

    fn apply_badge(&mut self, actions: BadgeActions) {
        let caps = self.platform.capabilities();
        if let Some(count) = actions.badge.filter(|_| caps.supports_badge_count) {
            self.platform.set_badge(&self.window, count);
        }

        if actions.bounce_dock {
            self.window
                .request_user_attention(Some(UserAttentionType::Informational));
        }

        match actions.flash_frame {
            Some(true) => self
                .window
                .request_user_attention(Some(UserAttentionType::Informational)),
            Some(false) => self.window.request_user_attention(None),
            None => {}
        }

        if let Some(tray) = self.tray.as_mut() {
            if let Some(unread) = actions.tray_unread {
                tray.set_unread(unread);
            }
            tray.set_count(actions.tooltip_count);
        }

        match actions.overlay.filter(|_| caps.supports_overlay_icon) {
            Some(OverlayAction::Clear) => self.platform.set_overlay_icon(&self.window, None),
            Some(OverlayAction::Request(count)) => {
                self.eval_page(&PageMessage::new("render-overlay-icon", json!({ "count": count })));
            }
            None => {}
        }
    }

    fn set_overlay(&self, data_url: &str) {
        let Some(image) = icons::decode_png_data_url(data_url) else {
            warn!("Page sent an unreadable overlay icon");
            return;
        };
        match tao::window::Icon::from_rgba(image.rgba, image.width, image.height) {
            Ok(icon) => self.platform.set_overlay_icon(&self.window, Some(&icon)),
            Err(e) => warn!("Invalid overlay icon: {}", e),
        }
    }

    fn sync_tray(&mut self) {
        self.sync_dock_menu();

        let prefs = self.state.prefs.get();
        if !tray::tray_wanted(self.state.platform, prefs) {
            if self.tray.take().is_some() {
                debug!("Tray icon removed");
            }
            return;
        }

        let visible = self.state.lifecycle.is_visible();
        if let Some(tray) = self.tray.as_ref() {
            tray.update_menu(visible, prefs.notifications_muted, &self.state.conversations);
            return;
        }

        match Tray::new(visible, prefs, &self.state.conversations, self.state.badge.count()) {
            Ok(tray) => self.tray = Some(tray),
            Err(e) => warn!("{}", e),
        }
    }

    fn sync_dock_menu(&mut self) {
        if !self.platform.capabilities().supports_dock_menu {
            return;
        }
        let menu = tray::build_dock_menu(
            self.state.prefs.get().notifications_muted,
            &self.state.conversations,
        );
        self.platform.set_dock_menu(Some(&menu));
        // Replaced only after the platform points at the new menu
        self.dock_menu = Some(menu);
    }

    // Menu

    fn refresh_menu(&mut self) {
        let tree = build_menu(self.state.prefs.get(), self.state.platform);
        if let Err(e) = self.menu.render(tree) {
            error!("Failed to update menu: {}", e);
        }
    }

    fn set_menu_bar_visible(&self, visible: bool) {
        if !self.platform.capabilities().supports_menu_bar_hiding {
            return;
        }
        if let Err(e) = self
            .platform
            .set_menu_bar_visible(&self.window, self.menu.menu(), visible)
        {
            warn!("Failed to toggle menu bar: {}", e);
        }
    }

    // A failed registration puts the check mark back
    fn set_launch_at_login(&mut self, enabled: bool) {
        let result = std::env::current_exe()
            .map_err(|e| e.to_string())
            .and_then(|exe| {
                self.platform
                    .set_launch_at_login(&exe, enabled)
                    .map_err(|e| e.to_string())
            });

        if let Err(e) = result {
            warn!("Failed to change launch at login: {}", e);
            if let Err(e) = self.state.prefs.set_bool(BoolPref::LaunchAtLogin, !enabled) {
                error!("Failed to restore launch at login preference: {}", e);
            }
        }
    }

    // Webviews

    fn eval_page(&self, message: &PageMessage) {
        eval_script(&self.webview, &message.to_script());
    }

    fn eval_in(&self, role: WindowRole, script: &str) {
        if role == WindowRole::Main {
            eval_script(&self.webview, script);
            return;
        }
        match self.aux.values().find(|view| view.role == role) {
            Some(view) => eval_script(&view.webview, script),
            None => debug!("No {:?} window for script", role),
        }
    }

    fn apply_zoom(&self, factor: f64) {
        if let Err(e) = self.webview.zoom(factor) {
            warn!("Failed to set zoom to {}: {}", factor, e);
        }
    }

    fn open_aux(&mut self, kind: AuxWindow, target: &EventLoopWindowTarget<UserEvent>) -> ChatwaveResult<()> {
        let role = match kind {
            AuxWindow::ProxySettings => WindowRole::ProxySettings,
            AuxWindow::Versions => WindowRole::Versions,
        };

        if let Some(view) = self.aux.values().find(|view| view.role == role) {
            view.window.set_focus();
            return Ok(());
        }

        let (title, html, height) = match kind {
            AuxWindow::ProxySettings => (
                "Proxy Settings",
                proxy_settings_html(self.state.prefs.get()),
                260.0,
            ),
            AuxWindow::Versions => ("Versions", versions_html(&webview_version()), 220.0),
        };

        let window = WindowBuilder::new()
            .with_title(title)
            .with_inner_size(LogicalSize::new(440.0, height))
            .with_resizable(false)
            .build(target)
            .map_err(|e| ChatwaveError::window(e.to_string()))?;

        let builder = WebViewBuilder::new()
            .with_html(&html)
            .with_ipc_handler(ipc_forwarder(self.proxy.clone(), role));
        let webview = build_webview(builder, &window)?;

        debug!("Opened {:?} window", role);
        self.aux.insert(window.id(), AuxView { webview, window, role });
        Ok(())
    }

    fn open_call_popup(&mut self, url: &str, target: &EventLoopWindowTarget<UserEvent>) -> ChatwaveResult<()> {
        let window = WindowBuilder::new()
            .with_title(format!("{} Call", APP_NAME))
            .with_inner_size(LogicalSize::new(800.0, 600.0))
            .with_min_inner_size(LogicalSize::new(400.0, 300.0))
            .build(target)
            .map_err(|e| ChatwaveError::window(e.to_string()))?;

        if let Some(icon) = icons::create_window_icon() {
            window.set_window_icon(Some(icon));
        }

        let external = self.proxy.clone();
        let agent = user_agent();
        let mut builder = WebViewBuilder::new()
            .with_url(url)
            .with_user_agent(&agent)
            .with_initialization_script(CALL_BRIDGE)
            .with_ipc_handler(ipc_forwarder(self.proxy.clone(), WindowRole::CallPopup))
            .with_navigation_handler(navigation_guard(self.proxy.clone()))
            .with_new_window_req_handler(move |url| {
                let _ = external.send_event(UserEvent::OpenExternal(url));
                false
            });
        if let Some(proxy) = proxy_config(self.state.prefs.get()) {
            builder = builder.with_proxy_config(proxy);
        }

        let webview = build_webview(builder, &window)?;
        info!("Opened call window");
        self.aux.insert(
            window.id(),
            AuxView {
                webview,
                window,
                role: WindowRole::CallPopup,
            },
        );
        Ok(())
    }

    fn close_aux(&mut self, id: WindowId, target: &EventLoopWindowTarget<UserEvent>) {
        let Some(view) = self.aux.remove(&id) else {
            return;
        };
        debug!("Closed {:?} window", view.role);
        let role = view.role;
        drop(view);

        if role == WindowRole::ProxySettings && std::mem::take(&mut self.state.proxy_dirty) {
            if DialogConfirmer.confirm(&commands::proxy_relaunch_prompt()) {
                self.state.request_relaunch(false);
                self.lifecycle(LifecycleEvent::QuitRequested, target);
            }
        }
    }

    // Displays

    fn check_displays(&mut self, target: &EventLoopWindowTarget<UserEvent>) {
        let count = self.window.available_monitors().count();
        if count < self.monitor_count {
            info!("Display removed ({} -> {})", self.monitor_count, count);
            self.lifecycle(LifecycleEvent::DisplayRemoved, target);
        }
        if count != self.monitor_count {
            self.update_display_scales();
        }
        self.monitor_count = count;
    }

    fn update_display_scales(&mut self) {
        let scales = self.window.available_monitors().map(|monitor| monitor.scale_factor());
        self.state.filter.set_display_scales(scales);
    }

    // External handlers

    fn open_external(&self, url: &str) {
        if let Err(e) = self.platform.open_external(url) {
            warn!("{}", e);
        }
    }

    fn open_path(&self, path: &Path) {
        if let Err(e) = self.platform.open_path(path) {
            warn!("{}", e);
        }
    }
}
