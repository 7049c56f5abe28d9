//! WebView helpers
//!
//! Building webviews inside tao windows, proxy configuration, the custom stylesheet and the
//! local pages shown in auxiliary windows.

use chatwave_core::config::{parse_proxy_address, ProxyScheme, APP_NAME};
use chatwave_core::prefs::Preferences;
use chatwave_core::{ChatwaveError, ChatwaveResult};
use serde_json::json;
use tao::window::Window;
use tracing::warn;
use wry::{ProxyConfig, ProxyEndpoint, WebView, WebViewBuilder};

pub const PROXY_SETTINGS_HTML: &str = include_str!("ui/proxy.html");
pub const VERSIONS_HTML: &str = include_str!("ui/versions.html");

const PROXY_STATE_PLACEHOLDER: &str = "__CHATWAVE_PROXY_STATE__";
const VERSIONS_PLACEHOLDER: &str = "__CHATWAVE_VERSIONS__";

/// Id of the `<style>` element holding the user stylesheet
const CUSTOM_CSS_ID: &str = "chatwave-custom-css";

/// Attach a configured builder to a tao window
///
/// On Linux the webview is packed into the window's GTK box below the menu bar.
pub fn build_webview<'a>(builder: WebViewBuilder<'a>, window: &'a Window) -> ChatwaveResult<WebView> {
    #[cfg(target_os = "linux")]
    {
        use tao::platform::unix::WindowExtUnix;
        use wry::WebViewBuilderExtUnix;

        if let Some(vbox) = window.default_vbox() {
            return builder
                .build_gtk(vbox)
                .map_err(|e| ChatwaveError::webview(e.to_string()));
        }
    }

    builder
        .build(window)
        .map_err(|e| ChatwaveError::webview(e.to_string()))
}

/// Fire-and-forget script evaluation
pub fn eval_script(webview: &WebView, script: &str) {
    if let Err(e) = webview.evaluate_script(script) {
        warn!("Script evaluation failed: {}", e);
    }
}

/// Proxy for the main webview when enabled and the address parses
pub fn proxy_config(prefs: &Preferences) -> Option<ProxyConfig> {
    if !prefs.use_proxy {
        return None;
    }

    let Some(rule) = parse_proxy_address(&prefs.proxy_address) else {
        warn!("Ignoring invalid proxy address {:?}", prefs.proxy_address);
        return None;
    };

    let endpoint = ProxyEndpoint {
        host: rule.host,
        port: rule.port.to_string(),
    };
    Some(match rule.scheme {
        ProxyScheme::Http => ProxyConfig::Http(endpoint),
        ProxyScheme::Socks5 => ProxyConfig::Socks5(endpoint),
    })
}

/// Environment switch that turns off GPU compositing in the platform webview
pub fn disable_gpu_env() -> Option<(&'static str, &'static str)> {
    if cfg!(target_os = "linux") {
        Some(("WEBKIT_DISABLE_COMPOSITING_MODE", "1"))
    } else if cfg!(target_os = "windows") {
        Some(("WEBVIEW2_ADDITIONAL_BROWSER_ARGUMENTS", "--disable-gpu"))
    } else {
        None
    }
}

/// Script that installs or replaces the user stylesheet
pub fn custom_css_script(css: &str) -> String {
    format!(
        r#"(function () {{
  var style = document.getElementById({id});
  if (!style) {{
    style = document.createElement('style');
    style.id = {id};
    (document.head || document.documentElement).appendChild(style);
  }}
  style.textContent = {css};
}})();"#,
        id = json!(CUSTOM_CSS_ID),
        css = json!(css),
    )
}

/// Proxy settings page prefilled with the stored values
pub fn proxy_settings_html(prefs: &Preferences) -> String {
    let state = json!({
        "enabled": prefs.use_proxy,
        "address": prefs.proxy_address,
    });
    PROXY_SETTINGS_HTML.replace(PROXY_STATE_PLACEHOLDER, &state.to_string())
}

/// Versions page listing the app and runtime versions
pub fn versions_html(webview_version: &str) -> String {
    let versions = json!([
        [APP_NAME, env!("CARGO_PKG_VERSION")],
        ["Webview", webview_version],
        ["OS", std::env::consts::OS],
        ["Architecture", std::env::consts::ARCH],
    ]);
    VERSIONS_HTML.replace(VERSIONS_PLACEHOLDER, &versions.to_string())
}

/// Version of the installed webview runtime, or "unknown"
pub fn webview_version() -> String {
    wry::webview_version().unwrap_or_else(|e| {
        warn!("Could not determine webview version: {}", e);
        "unknown".to_string()
    })
}
