//! Application paths, constants and environment-derived settings

use std::path::{Path, PathBuf};

/// Application name shown in menus and window titles
pub const APP_NAME: &str = "Chatwave";

/// Default Messenger entry point
pub const MESSENGER_URL: &str = "https://www.messenger.com/login/";

/// Work Chat entry point
pub const WORK_CHAT_URL: &str = "https://work.facebook.com/chat";

pub const REPOSITORY_URL: &str = "https://github.com/yourusername/chatwave";
pub const WEBSITE_URL: &str = "https://github.com/yourusername/chatwave#readme";
pub const DONATE_URL: &str = "https://github.com/yourusername/chatwave?sponsor=1";

/// GitHub API endpoint for the latest release
pub const LATEST_RELEASE_API: &str =
    "https://api.github.com/repos/yourusername/chatwave/releases/latest";

/// Chrome version advertised in the user agent
const CHROME_VERSION: &str = "124.0.6367.243";

/// Data directory override
pub const DATA_DIR_ENV: &str = "CHATWAVE_DATA_DIR";

/// Contents written when the user opens the custom stylesheet for the first time
pub const DEFAULT_CUSTOM_CSS: &str = "/*
This is the custom styles file where you can add anything you want.
The styles here will be injected into Chatwave and will override default styles.
If you want to disable styles but keep the config, just comment the lines that you don't want to be used.

Press Command/Ctrl+R in Chatwave to see your changes.
*/
";

/// Locations of everything Chatwave persists
#[derive(Debug, Clone)]
pub struct AppPaths {
    data_dir: PathBuf,
}

impl AppPaths {
    /// Resolve paths from the environment, falling back to the platform data directory
    pub fn resolve() -> Self {
        let data_dir = std::env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("chatwave")
            });
        Self { data_dir }
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    pub fn custom_css(&self) -> PathBuf {
        self.data_dir.join("custom.css")
    }

    pub fn instance_lock(&self) -> PathBuf {
        self.data_dir.join("instance.lock")
    }

    /// Create the data directory if it does not exist yet
    pub fn ensure_data_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }

    /// Read the user stylesheet, if one exists
    pub fn read_custom_css(&self) -> Option<String> {
        match std::fs::read_to_string(self.custom_css()) {
            Ok(css) => Some(css),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Failed to read custom stylesheet: {}", e);
                None
            }
        }
    }

    /// Write the default stylesheet unless the user already has one; returns its path
    pub fn ensure_custom_css(&self) -> std::io::Result<PathBuf> {
        let path = self.custom_css();
        if !path.exists() {
            self.ensure_data_dir()?;
            std::fs::write(&path, DEFAULT_CUSTOM_CSS)?;
        }
        Ok(path)
    }
}

/// User agent of a current desktop Chrome for the given OS and architecture
///
/// `os` and `arch` take the values of `std::env::consts::{OS, ARCH}`.
pub fn user_agent_for(os: &str, arch: &str) -> String {
    let platform = match (os, arch) {
        ("windows", "x86") => "Windows NT 10.0; WOW64",
        ("windows", "aarch64") => "Windows NT 10.0; ARM64",
        ("windows", _) => "Windows NT 10.0; Win64; x64",
        ("linux", "aarch64") => "X11; Linux aarch64",
        ("linux", _) => "X11; Linux x86_64",
        ("macos", _) => "Macintosh; Intel Mac OS X 10_14_6",
        _ => "X11; CrOS x86_64 10066.0.0",
    };

    format!(
        "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
        platform, CHROME_VERSION
    )
}

/// User agent for the running binary
pub fn user_agent() -> String {
    user_agent_for(std::env::consts::OS, std::env::consts::ARCH)
}

/// Locale Messenger falls back to
pub const DEFAULT_LOCALE: &str = "en_US";

// Region picked when the system only names a language
const DEFAULT_REGIONS: &[(&str, &str)] = &[
    ("ar", "AR"),
    ("cs", "CZ"),
    ("da", "DK"),
    ("de", "DE"),
    ("en", "US"),
    ("es", "ES"),
    ("fr", "FR"),
    ("it", "IT"),
    ("ja", "JP"),
    ("ko", "KR"),
    ("nb", "NO"),
    ("nl", "NL"),
    ("pl", "PL"),
    ("pt", "BR"),
    ("ru", "RU"),
    ("sv", "SE"),
    ("tr", "TR"),
    ("uk", "UA"),
    ("zh", "CN"),
];

/// Map a system locale such as `de-DE`, `pt_BR.UTF-8` or `fr` onto Messenger's `ll_CC` form
///
/// Unknown or unusable input gives `en_US`.
pub fn messenger_locale(system: &str) -> String {
    let tag = system
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .replace('-', "_");
    let mut parts = tag.split('_');
    let language = parts.next().unwrap_or_default().to_ascii_lowercase();
    let region = parts.next().map(str::to_ascii_uppercase);

    if language.len() != 2 || !language.chars().all(|c| c.is_ascii_lowercase()) {
        return DEFAULT_LOCALE.to_string();
    }

    match region {
        Some(region) if region.len() == 2 && region.chars().all(|c| c.is_ascii_uppercase()) => {
            format!("{}_{}", language, region)
        }
        _ => DEFAULT_REGIONS
            .iter()
            .find(|(lang, _)| *lang == language)
            .map(|(lang, region)| format!("{}_{}", lang, region))
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
    }
}

/// Messenger locale for the current user, from `LC_ALL`, `LC_MESSAGES` or `LANG`
pub fn user_locale() -> String {
    let system = ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty() && value != "C" && value != "POSIX")
        .unwrap_or_default();
    messenger_locale(&system)
}

/// Proxy protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyScheme {
    Http,
    Socks5,
}

/// A single proxy endpoint parsed from the `proxyAddress` preference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRule {
    pub scheme: ProxyScheme,
    pub host: String,
    pub port: u16,
}

/// Parse `http://host:port`, `socks5://host:port` or bare `host:port`
///
/// Returns `None` for anything else, including a missing or invalid port.
pub fn parse_proxy_address(address: &str) -> Option<ProxyRule> {
    let address = address.trim();
    if address.is_empty() {
        return None;
    }

    let (scheme, rest) = match address.split_once("://") {
        Some((scheme, rest)) => match scheme.to_ascii_lowercase().as_str() {
            "http" | "https" => (ProxyScheme::Http, rest),
            "socks5" | "socks" => (ProxyScheme::Socks5, rest),
            _ => return None,
        },
        None => (ProxyScheme::Http, address),
    };

    let rest = rest.trim_end_matches('/');
    let (host, port) = rest.rsplit_once(':')?;
    if host.is_empty() || host.contains('/') {
        return None;
    }
    let port = port.parse::<u16>().ok().filter(|p| *p != 0)?;

    Some(ProxyRule {
        scheme,
        host: host.to_string(),
        port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_linux_x64() {
        let ua = user_agent_for("linux", "x86_64");
        assert!(ua.contains("X11; Linux x86_64"));
        assert!(ua.contains("Chrome/124.0.6367.243"));
    }

    #[test]
    fn test_user_agent_windows_variants() {
        assert!(user_agent_for("windows", "x86_64").contains("Win64; x64"));
        assert!(user_agent_for("windows", "x86").contains("WOW64"));
        assert!(user_agent_for("windows", "aarch64").contains("ARM64"));
    }

    #[test]
    fn test_user_agent_fallback() {
        assert!(user_agent_for("freebsd", "x86_64").contains("CrOS"));
        assert!(user_agent_for("macos", "aarch64").contains("Macintosh"));
    }

    #[test]
    fn test_messenger_locale() {
        assert_eq!(messenger_locale("de-DE"), "de_DE");
        assert_eq!(messenger_locale("pt_BR.UTF-8"), "pt_BR");
        assert_eq!(messenger_locale("sr_RS@latin"), "sr_RS");
        assert_eq!(messenger_locale("fr"), "fr_FR");
        assert_eq!(messenger_locale("EN-gb"), "en_GB");
    }

    #[test]
    fn test_messenger_locale_fallback() {
        assert_eq!(messenger_locale(""), DEFAULT_LOCALE);
        assert_eq!(messenger_locale("C.UTF-8"), DEFAULT_LOCALE);
        assert_eq!(messenger_locale("xx"), DEFAULT_LOCALE);
        assert_eq!(messenger_locale("de_Germany"), "de_DE");
    }

    #[test]
    fn test_parse_proxy_address() {
        assert_eq!(
            parse_proxy_address("socks5://127.0.0.1:9050"),
            Some(ProxyRule {
                scheme: ProxyScheme::Socks5,
                host: "127.0.0.1".into(),
                port: 9050
            })
        );
        assert_eq!(
            parse_proxy_address("proxy.local:3128").map(|p| p.scheme),
            Some(ProxyScheme::Http)
        );
        assert_eq!(
            parse_proxy_address("http://proxy.local:8080/").map(|p| p.port),
            Some(8080)
        );
    }

    #[test]
    fn test_parse_proxy_address_rejects_garbage() {
        assert_eq!(parse_proxy_address(""), None);
        assert_eq!(parse_proxy_address("proxy.local"), None);
        assert_eq!(parse_proxy_address("ftp://proxy.local:21"), None);
        assert_eq!(parse_proxy_address("proxy.local:99999"), None);
        assert_eq!(parse_proxy_address(":8080"), None);
    }

    #[test]
    fn test_custom_css_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::with_data_dir(dir.path().join("nested"));

        assert!(paths.read_custom_css().is_none());

        let path = paths.ensure_custom_css().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CUSTOM_CSS);

        std::fs::write(&path, "body { color: red; }").unwrap();
        paths.ensure_custom_css().unwrap();
        assert_eq!(paths.read_custom_css().as_deref(), Some("body { color: red; }"));
    }
}
