//! Navigation policy for the embedded Messenger page
//!
//! Decides whether a navigation stays inside the app, is handed to the system browser, or (for
//! call popups) opens a restricted auxiliary window.

use crate::tracking::strip_tracking;
use url::Url;

const CHECKPOINT_URL: &str = "https://www.facebook.com/checkpoint";

/// How the page asked for the navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    SameTab,
    ForegroundTab,
    BackgroundTab,
    NewWindow,
}

impl Disposition {
    /// Parse the bridge's disposition name; unknown names are treated as a new window
    pub fn from_name(name: &str) -> Self {
        match name {
            "same-tab" | "current-tab" => Disposition::SameTab,
            "foreground-tab" => Disposition::ForegroundTab,
            "background-tab" => Disposition::BackgroundTab,
            _ => Disposition::NewWindow,
        }
    }
}

/// A single navigation or new-window request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    pub url: String,
    pub disposition: Disposition,
    pub frame_name: Option<String>,
}

impl NavigationIntent {
    pub fn new(url: impl Into<String>, disposition: Disposition) -> Self {
        Self {
            url: url.into(),
            disposition,
            frame_name: None,
        }
    }

    pub fn with_frame_name(mut self, frame_name: impl Into<String>) -> Self {
        self.frame_name = Some(frame_name.into());
        self
    }
}

/// Outcome of evaluating a navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Let the webview navigate
    AllowInPlace,
    /// Cancel and hand the (stripped) URL to the system browser
    OpenExternally(String),
    /// Create a capability-limited popup window (voice/video calls)
    AllowRestrictedWindow,
    /// Cancel without opening anything
    Deny,
}

impl NavigationDecision {
    pub fn allows_in_place(&self) -> bool {
        matches!(self, NavigationDecision::AllowInPlace)
    }
}

/// Hostname is messenger.com or one of its subdomains
pub fn is_messenger_domain(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| host == "messenger.com" || host.ends_with(".messenger.com"))
}

/// Identity/two-factor checkpoint on the Facebook auth domain
pub fn is_two_factor_auth(url: &str) -> bool {
    url.starts_with(CHECKPOINT_URL)
}

/// Workplace chat hosts, partner login/chat paths and the SSO provider
pub fn is_work_chat(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };

    if host == "work.facebook.com" || host == "work.workplace.com" {
        return true;
    }

    // company-name.facebook.com/login, company-name.workplace.com/chat, ...
    let partner = host.ends_with(".facebook.com") || host.ends_with(".workplace.com");
    let path = url.path();
    if partner && (path.starts_with("/login") || path.starts_with("/chat")) {
        return true;
    }

    host == "login.microsoftonline.com"
}

fn is_internal_frame(url: &str) -> bool {
    url == "about:blank" || url == "about:srcdoc"
}

fn is_call_popup_url(url: &str) -> bool {
    url == "about:blank" || url == "about:blank#blocked"
}

/// Decide an in-place (same tab) navigation
pub fn evaluate_navigation(url: &str) -> NavigationDecision {
    if is_internal_frame(url) {
        return NavigationDecision::AllowInPlace;
    }

    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("Malformed navigation target {:?}: {}", url, e);
            return NavigationDecision::OpenExternally(url.to_string());
        }
    };

    if is_messenger_domain(&parsed) || is_two_factor_auth(url) || is_work_chat(&parsed) {
        return NavigationDecision::AllowInPlace;
    }

    if !matches!(parsed.scheme(), "http" | "https" | "mailto") {
        log::debug!("Refusing navigation to {} scheme", parsed.scheme());
        return NavigationDecision::Deny;
    }

    NavigationDecision::OpenExternally(strip_tracking(url))
}

/// Decide a request to open a new tab or window
pub fn evaluate_new_window(intent: &NavigationIntent) -> NavigationDecision {
    match intent.disposition {
        Disposition::SameTab => evaluate_navigation(&intent.url),
        Disposition::ForegroundTab | Disposition::BackgroundTab => {
            NavigationDecision::OpenExternally(strip_tracking(&intent.url))
        }
        Disposition::NewWindow => {
            if is_call_popup_url(&intent.url) {
                if intent.frame_name.as_deref() != Some("about:blank") {
                    NavigationDecision::AllowRestrictedWindow
                } else {
                    NavigationDecision::Deny
                }
            } else {
                NavigationDecision::OpenExternally(strip_tracking(&intent.url))
            }
        }
    }
}

/// Schemes the system opener is allowed to receive
pub fn is_safe_external(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https" | "mailto"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messenger_thread_allowed() {
        assert_eq!(
            evaluate_navigation("https://www.messenger.com/t/123"),
            NavigationDecision::AllowInPlace
        );
        assert!(evaluate_navigation("https://messenger.com/").allows_in_place());
        assert!(evaluate_navigation("https://static.messenger.com/x.js").allows_in_place());
    }

    #[test]
    fn test_lookalike_domain_is_external() {
        assert_eq!(
            evaluate_navigation("https://notmessenger.com/"),
            NavigationDecision::OpenExternally("https://notmessenger.com/".into())
        );
        assert!(!evaluate_navigation("https://www.messenger.com.evil.io/").allows_in_place());
    }

    #[test]
    fn test_checkpoint_allowed() {
        assert!(evaluate_navigation("https://www.facebook.com/checkpoint/?next").allows_in_place());
        assert!(!evaluate_navigation("https://www.facebook.com/profile.php").allows_in_place());
    }

    #[test]
    fn test_work_chat_predicates() {
        for url in [
            "https://work.facebook.com/chat",
            "https://work.workplace.com/",
            "https://acme.facebook.com/login/?next=x",
            "https://acme.workplace.com/chat/t/1",
            "https://login.microsoftonline.com/common/oauth2",
        ] {
            assert!(evaluate_navigation(url).allows_in_place(), "{}", url);
        }
        assert!(!evaluate_navigation("https://acme.workplace.com/groups").allows_in_place());
    }

    #[test]
    fn test_unrelated_domain_is_stripped() {
        assert_eq!(
            evaluate_navigation("https://example.com/a?utm_source=chat&id=1"),
            NavigationDecision::OpenExternally("https://example.com/a?id=1".into())
        );
    }

    #[test]
    fn test_malformed_url_goes_external() {
        assert_eq!(
            evaluate_navigation("http://[broken"),
            NavigationDecision::OpenExternally("http://[broken".into())
        );
    }

    #[test]
    fn test_internal_frames_and_odd_schemes() {
        assert!(evaluate_navigation("about:blank").allows_in_place());
        assert!(evaluate_navigation("about:srcdoc").allows_in_place());
        assert_eq!(evaluate_navigation("javascript:alert(1)"), NavigationDecision::Deny);
        assert_eq!(evaluate_navigation("file:///etc/passwd"), NavigationDecision::Deny);
    }

    #[test]
    fn test_foreground_tab_opens_external_stripped() {
        let intent = NavigationIntent::new(
            "https://evil.example.com/?fbclid=abc",
            Disposition::ForegroundTab,
        );
        assert_eq!(
            evaluate_new_window(&intent),
            NavigationDecision::OpenExternally("https://evil.example.com/".into())
        );
    }

    #[test]
    fn test_tabs_never_open_internally() {
        let intent =
            NavigationIntent::new("https://www.messenger.com/t/1", Disposition::BackgroundTab);
        assert_eq!(
            evaluate_new_window(&intent),
            NavigationDecision::OpenExternally("https://www.messenger.com/t/1".into())
        );
    }

    #[test]
    fn test_call_popup_gets_restricted_window() {
        let intent = NavigationIntent::new("about:blank", Disposition::NewWindow)
            .with_frame_name("call-popup");
        assert_eq!(
            evaluate_new_window(&intent),
            NavigationDecision::AllowRestrictedWindow
        );

        let blocked = NavigationIntent::new("about:blank#blocked", Disposition::NewWindow);
        assert_eq!(
            evaluate_new_window(&blocked),
            NavigationDecision::AllowRestrictedWindow
        );
    }

    #[test]
    fn test_top_frame_blank_window_is_denied() {
        let intent = NavigationIntent::new("about:blank", Disposition::NewWindow)
            .with_frame_name("about:blank");
        assert_eq!(evaluate_new_window(&intent), NavigationDecision::Deny);
    }

    #[test]
    fn test_other_new_window_is_external() {
        let intent = NavigationIntent::new(
            "https://l.messenger.com/l.php?u=https%3A%2F%2Fnews.example%2F%3Fgclid%3Dq",
            Disposition::NewWindow,
        );
        assert_eq!(
            evaluate_new_window(&intent),
            NavigationDecision::OpenExternally("https://news.example/".into())
        );
    }

    #[test]
    fn test_disposition_names() {
        assert_eq!(Disposition::from_name("foreground-tab"), Disposition::ForegroundTab);
        assert_eq!(Disposition::from_name("background-tab"), Disposition::BackgroundTab);
        assert_eq!(Disposition::from_name("same-tab"), Disposition::SameTab);
        assert_eq!(Disposition::from_name("whatever"), Disposition::NewWindow);
    }

    #[test]
    fn test_safe_external_schemes() {
        assert!(is_safe_external("https://example.com"));
        assert!(is_safe_external("mailto:a@b.c"));
        assert!(!is_safe_external("file:///tmp/x"));
        assert!(!is_safe_external("not a url"));
    }
}
