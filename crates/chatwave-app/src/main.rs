//! Chatwave - desktop client for Messenger
//!
//! One tao event loop owns every window and webview. Webview callbacks, the tray, native menus,
//! notification threads and background pollers talk to it only through `UserEvent`s.

mod app;
mod badge;
mod commands;
mod icons;
mod ipc;
mod menu;
mod notifications;
mod platform;
mod single_instance;
mod state;
mod tray;
mod updater;
mod webview;
mod window;

use anyhow::Context;
use app::{ipc_forwarder, navigation_guard, App};
use chatwave_core::config::{user_agent, user_locale, APP_NAME};
use chatwave_core::logging::{init_logging, LogConfig};
use chatwave_core::prefs::Preferences;
use chatwave_core::retry::{retry_with_backoff, RetryConfig};
use chatwave_core::{AppPaths, Platform};
use chatwave_shield::{evaluate_new_window, BeaconCategory, Disposition, NavigationDecision, NavigationIntent};
use ipc::{bridge_script, locale_cookie_script, IpcMessage, WindowRole};
use menu::build_menu;
use menu::render::MenuRenderer;
use muda::{MenuEvent, MenuId};
use notifications::NotificationEvent;
use platform::get_platform_manager;
use single_instance::InstanceLock;
use state::AppState;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tao::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use tao::event::Event;
use tao::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy, EventLoopWindowTarget};
use tao::window::{Window, WindowBuilder};
use tracing::{debug, error, info, warn};
use tray_icon::{MouseButton, MouseButtonState, TrayIconEvent};
use updater::UpdateInfo;
use webview::{build_webview, disable_gpu_env, proxy_config};
use wry::{PageLoadEvent, WebViewBuilder};

/// Events delivered to the main event loop
#[derive(Debug, Clone)]
pub enum UserEvent {
    /// Message from a webview bridge
    Ipc { role: WindowRole, message: IpcMessage },
    /// Menu bar or tray menu selection
    Menu(MenuId),
    TrayClick,
    Notification(NotificationEvent),
    SecondInstance,
    /// The main webview finished loading a page
    PageLoaded,
    OpenExternal(String),
    DisplayTick,
    DndChanged(bool),
    UpdateTick,
    UpdateAvailable(UpdateInfo),
}

const DISPLAY_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DND_POLL_INTERVAL: Duration = Duration::from_secs(60);

const CONNECTIVITY_ADDR: &str = "www.messenger.com:443";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

fn main() {
    let log_config = if cfg!(debug_assertions) {
        LogConfig::debug()
    } else {
        LogConfig::default()
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("{}", e);
    }

    info!("Starting {} {}", APP_NAME, env!("CARGO_PKG_VERSION"));

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let paths = AppPaths::resolve();
    paths
        .ensure_data_dir()
        .with_context(|| format!("Failed to create data directory {:?}", paths.data_dir()))?;

    let mut guard = match single_instance::acquire(paths.instance_lock())
        .context("Failed to acquire the instance lock")?
    {
        InstanceLock::Primary(guard) => guard,
        InstanceLock::Secondary => {
            info!("{} is already running, handed off to it", APP_NAME);
            return Ok(());
        }
    };

    ensure_online();

    let mut state = AppState::new(paths, Platform::current());
    info!("Preferences loaded from {:?}", state.prefs.path());

    if !state.prefs.get().hardware_acceleration {
        if let Some((key, value)) = disable_gpu_env() {
            info!("Hardware acceleration disabled");
            std::env::set_var(key, value);
        }
    }

    let event_loop = EventLoopBuilder::<UserEvent>::with_user_event().build();
    let proxy = event_loop.create_proxy();

    let window = create_main_window(&event_loop, state.prefs.get())?;

    let platform = get_platform_manager();
    info!("Platform: {}", platform.platform_name());

    let mut menu = MenuRenderer::new();
    menu.render(build_menu(state.prefs.get(), state.platform))
        .context("Failed to build the application menu")?;
    if let Err(e) = platform.initialize_menu(&window, menu.menu()) {
        // Usable without a menu bar; shortcuts are lost
        error!("Failed to initialize menu: {}", e);
    }
    if state.prefs.get().auto_hide_menu_bar && platform.capabilities().supports_menu_bar_hiding {
        if let Err(e) = platform.set_menu_bar_visible(&window, menu.menu(), false) {
            warn!("Failed to hide menu bar: {}", e);
        }
    }

    let agent = user_agent();
    let bridge = bridge_script(BeaconCategory::url_markers(), state.platform);
    let locale = user_locale();
    debug!("Messenger locale: {}", locale);
    let locale_cookie = locale_cookie_script(&locale);
    let external = proxy.clone();
    let loaded = proxy.clone();

    let mut builder = WebViewBuilder::new()
        .with_url(state.start_url())
        .with_user_agent(&agent)
        .with_initialization_script(&locale_cookie)
        .with_initialization_script(&bridge)
        .with_devtools(true)
        .with_ipc_handler(ipc_forwarder(proxy.clone(), WindowRole::Main))
        .with_navigation_handler(navigation_guard(proxy.clone()))
        .with_new_window_req_handler(move |url| {
            // Popups the bridge did not intercept are treated as new tabs
            let intent = NavigationIntent::new(url, Disposition::ForegroundTab);
            if let NavigationDecision::OpenExternally(target) = evaluate_new_window(&intent) {
                let _ = external.send_event(UserEvent::OpenExternal(target));
            }
            false
        })
        .with_on_page_load_handler(move |event, url| {
            if let PageLoadEvent::Finished = event {
                debug!("Loaded {}", url);
                let _ = loaded.send_event(UserEvent::PageLoaded);
            }
        });
    if let Some(proxy_config) = proxy_config(state.prefs.get()) {
        info!("Using proxy {}", state.prefs.get().proxy_address);
        builder = builder.with_proxy_config(proxy_config);
    }
    let webview = build_webview(builder, &window).context("Failed to create the Messenger webview")?;
    info!("Loading {}", state.start_url());

    let activate = proxy.clone();
    if let Err(e) = guard.listen(move || {
        let _ = activate.send_event(UserEvent::SecondInstance);
    }) {
        warn!("Second launches will not be forwarded: {}", e);
    }
    state.set_instance_guard(guard);

    let menu_proxy = proxy.clone();
    MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
        let _ = menu_proxy.send_event(UserEvent::Menu(event.id));
    }));

    let tray_proxy = proxy.clone();
    TrayIconEvent::set_event_handler(Some(move |event: TrayIconEvent| {
        if let TrayIconEvent::Click {
            button: MouseButton::Left,
            button_state: MouseButtonState::Up,
            ..
        } = event
        {
            let _ = tray_proxy.send_event(UserEvent::TrayClick);
        }
    }));

    spawn_ticker("display-poll", DISPLAY_POLL_INTERVAL, proxy.clone(), || UserEvent::DisplayTick);
    spawn_dnd_watcher(proxy.clone());
    updater::spawn_ticker(proxy.clone());

    let mut app = App::new(state, window, webview, menu, platform, proxy);
    info!("{} initialized", APP_NAME);

    event_loop.run(move |event, target, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(user_event) => app.handle_user_event(user_event, target),
            Event::WindowEvent {
                window_id, event, ..
            } => app.handle_window_event(window_id, event, target),
            Event::Reopen { .. } => app.handle_reopen(target),
            Event::LoopDestroyed => {
                let plan = app.shutdown();
                std::process::exit(state::finish(plan));
            }
            _ => {}
        }

        if app.exit_requested() {
            *control_flow = ControlFlow::Exit;
        }
    })
}

fn create_main_window(
    target: &EventLoopWindowTarget<UserEvent>,
    prefs: &Preferences,
) -> anyhow::Result<Window> {
    let saved = prefs.last_window_state;
    let mut builder = WindowBuilder::new()
        .with_title(APP_NAME)
        .with_inner_size(PhysicalSize::new(saved.width, saved.height))
        .with_min_inner_size(LogicalSize::new(400.0, 200.0))
        .with_always_on_top(prefs.always_on_top)
        // Shown once the page has loaded
        .with_visible(false)
        .with_window_icon(icons::create_window_icon());

    if let (Some(x), Some(y)) = (saved.x, saved.y) {
        builder = builder.with_position(PhysicalPosition::new(x, y));
    }

    builder.build(target).context("Failed to create the main window")
}

/// Block until Messenger is reachable, giving up after the retry budget
fn ensure_online() {
    let result = retry_with_backoff(&RetryConfig::connectivity(), |attempt| {
        debug!(attempt, "Checking connectivity");
        check_connectivity()
    });

    if let Err(e) = result {
        warn!("Messenger looks unreachable, continuing anyway: {}", e);
    }
}

fn check_connectivity() -> std::io::Result<()> {
    let addr = CONNECTIVITY_ADDR
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no address for Messenger"))?;
    TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).map(|_| ())
}

fn spawn_ticker(
    name: &str,
    interval: Duration,
    proxy: EventLoopProxy<UserEvent>,
    event: fn() -> UserEvent,
) {
    let spawned = std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || loop {
            std::thread::sleep(interval);
            if proxy.send_event(event()).is_err() {
                break;
            }
        });

    if let Err(e) = spawned {
        warn!("Failed to spawn {} thread: {}", name, e);
    }
}

/// Poll do-not-disturb and report changes
fn spawn_dnd_watcher(proxy: EventLoopProxy<UserEvent>) {
    let spawned = std::thread::Builder::new()
        .name("dnd-watcher".into())
        .spawn(move || {
            let platform = get_platform_manager();
            let mut last = None;
            loop {
                let dnd = platform.do_not_disturb();
                if last != Some(dnd) {
                    last = Some(dnd);
                    if proxy.send_event(UserEvent::DndChanged(dnd)).is_err() {
                        break;
                    }
                }
                std::thread::sleep(DND_POLL_INTERVAL);
            }
        });

    if let Err(e) = spawned {
        warn!("Failed to spawn do-not-disturb watcher: {}", e);
    }
}
