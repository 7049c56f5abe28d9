//! Privacy and navigation guards for Chatwave
//!
//! Uses Brave's adblock-rust engine to recognise Messenger's receipt beacons, and carries the
//! navigation policy that keeps the app on Messenger's own domains.

pub mod filter_lists;
pub mod navigation;
pub mod tracking;

use adblock::lists::ParseOptions;
use adblock::Engine;
use chatwave_core::prefs::BlockPrefs;
use url::Url;

pub use filter_lists::BeaconCategory;
pub use navigation::{
    evaluate_navigation, evaluate_new_window, Disposition, NavigationDecision, NavigationIntent,
};
pub use tracking::strip_tracking;

/// `content-md5` of the incoming call ringtone served from the static CDN
pub const CALL_RINGTONE_MD5: &str = "2NAu/QVqg211BbktgY5GkA==";

const RSRC_HOST: &str = "static.xx.fbcdn.net";

/// Request filter for the embedded Messenger page
pub struct RequestFilter {
    engines: Vec<(BeaconCategory, Engine)>,
    max_scale_factor: f64,
}

impl RequestFilter {
    /// Creates a filter with one engine per beacon category
    pub fn new() -> Self {
        log::info!("Initializing request filter");

        let engines = BeaconCategory::ALL
            .iter()
            .map(|category| {
                let engine =
                    Engine::from_rules(category.rules().iter().copied(), ParseOptions::default());
                (*category, engine)
            })
            .collect();

        Self {
            engines,
            max_scale_factor: 1.0,
        }
    }

    /// Which beacon category a request belongs to, if any
    pub fn classify(&self, url: &str, source_url: &str, resource_type: ResourceType) -> Option<BeaconCategory> {
        let request = match adblock::request::Request::new(url, source_url, resource_type.as_str()) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("Failed to create request for {}: {:?}", url, e);
                return None;
            }
        };

        self.engines
            .iter()
            .find(|(_, engine)| engine.check_network_request(&request).matched)
            .map(|(category, _)| *category)
    }

    /// Whether an outgoing request should be cancelled under the current block preferences
    pub fn should_cancel(
        &self,
        url: &str,
        source_url: &str,
        resource_type: ResourceType,
        block: &BlockPrefs,
    ) -> bool {
        match self.classify(url, source_url, resource_type) {
            Some(category) if category.is_blocked(block) => {
                log::debug!("Cancelled {:?} beacon: {}", category, url);
                true
            }
            _ => false,
        }
    }

    /// Track the highest scale factor across connected displays
    pub fn set_display_scales<I>(&mut self, scales: I)
    where
        I: IntoIterator<Item = f64>,
    {
        let max = scales
            .into_iter()
            .filter(|s| s.is_finite() && *s > 0.0)
            .fold(1.0_f64, f64::max);

        if (max - self.max_scale_factor).abs() > f64::EPSILON {
            log::info!("Highest display scale factor is now {}", max);
        }
        self.max_scale_factor = max;
    }

    pub fn max_scale_factor(&self) -> f64 {
        self.max_scale_factor
    }

    /// Rewrite the `Cookie` header of a request so Messenger serves assets for the sharpest display
    ///
    /// Returns `None` when the request should be left alone: non-GET, off-domain, no cookie, or
    /// all displays at 1x.
    pub fn rewrite_cookie_header(&self, method: &str, url: &str, cookie: Option<&str>) -> Option<String> {
        if !method.eq_ignore_ascii_case("GET") || self.max_scale_factor == 1.0 {
            return None;
        }

        let parsed = Url::parse(url).ok()?;
        if !navigation::is_messenger_domain(&parsed) {
            return None;
        }

        let cookie = cookie.filter(|c| !c.trim().is_empty())?;
        Some(rewrite_dpr_cookie(cookie, self.max_scale_factor))
    }

    /// Whether a response should be dropped to silence the call ringtone
    pub fn should_cancel_response(&self, url: &str, content_md5: Option<&str>, ringtone_muted: bool) -> bool {
        if !ringtone_muted {
            return false;
        }

        let is_rsrc = Url::parse(url)
            .map(|u| u.host_str() == Some(RSRC_HOST) && u.path().starts_with("/rsrc.php/"))
            .unwrap_or(false);

        is_rsrc && content_md5.map(str::trim) == Some(CALL_RINGTONE_MD5)
    }
}

impl Default for RequestFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Set or append the `dpr` pair in a cookie string, leaving every other pair untouched
pub fn rewrite_dpr_cookie(cookie: &str, scale: f64) -> String {
    let mut found = false;
    let segments: Vec<String> = cookie
        .split(';')
        .map(|segment| {
            let trimmed = segment.trim_start();
            match trimmed.split_once('=') {
                Some((name, _)) if name.trim() == "dpr" => {
                    found = true;
                    let indent = &segment[..segment.len() - trimmed.len()];
                    format!("{}dpr={}", indent, scale)
                }
                _ => segment.to_string(),
            }
        })
        .collect();

    if found {
        segments.join(";")
    } else {
        format!("{}; dpr={}", cookie, scale)
    }
}

/// Type of resource being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Document,
    Script,
    Image,
    Xhr,
    Ping,
    Media,
    Other,
}

impl ResourceType {
    fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Document => "document",
            ResourceType::Script => "script",
            ResourceType::Image => "image",
            ResourceType::Xhr => "xmlhttprequest",
            ResourceType::Ping => "ping",
            ResourceType::Media => "media",
            ResourceType::Other => "other",
        }
    }

    /// Map the bridge's request kind (`fetch`, `xhr`, `beacon`, ...) to a resource type
    pub fn from_name(name: &str) -> Self {
        match name {
            "fetch" | "xhr" | "xmlhttprequest" => ResourceType::Xhr,
            "beacon" | "ping" => ResourceType::Ping,
            "document" => ResourceType::Document,
            "script" => ResourceType::Script,
            "image" => ResourceType::Image,
            "media" => ResourceType::Media,
            _ => ResourceType::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "https://www.messenger.com/t/1";

    fn all_blocked() -> BlockPrefs {
        BlockPrefs {
            typing_indicator: true,
            chat_seen: true,
            delivery_receipt: true,
        }
    }

    #[test]
    fn test_classifies_beacons() {
        let filter = RequestFilter::new();
        assert_eq!(
            filter.classify("https://www.messenger.com/ajax/messaging/typ.php?dpr=1", SOURCE, ResourceType::Xhr),
            Some(BeaconCategory::TypingIndicator)
        );
        assert_eq!(
            filter.classify("https://www.messenger.com/ajax/mercury/change_read_status.php", SOURCE, ResourceType::Xhr),
            Some(BeaconCategory::ReadStatus)
        );
        assert_eq!(
            filter.classify("https://www.messenger.com/ajax/mercury/delivery_receipts.php", SOURCE, ResourceType::Xhr),
            Some(BeaconCategory::DeliveryReceipt)
        );
        assert_eq!(
            filter.classify("https://www.messenger.com/ajax/mercury/unread_threads.php", SOURCE, ResourceType::Xhr),
            Some(BeaconCategory::DeliveryReceipt)
        );
    }

    #[test]
    fn test_ordinary_requests_pass() {
        let filter = RequestFilter::new();
        assert!(!filter.should_cancel(
            "https://www.messenger.com/api/graphql/",
            SOURCE,
            ResourceType::Xhr,
            &all_blocked()
        ));
        assert!(!filter.should_cancel(
            "https://example.com/ajax/typ.php",
            SOURCE,
            ResourceType::Xhr,
            &all_blocked()
        ));
    }

    #[test]
    fn test_categories_toggle_independently() {
        let filter = RequestFilter::new();
        let block = BlockPrefs {
            typing_indicator: true,
            ..Default::default()
        };

        assert!(filter.should_cancel(
            "https://www.messenger.com/ajax/messaging/typ.php",
            SOURCE,
            ResourceType::Xhr,
            &block
        ));
        assert!(!filter.should_cancel(
            "https://www.messenger.com/ajax/mercury/change_read_status.php",
            SOURCE,
            ResourceType::Xhr,
            &block
        ));
        assert!(!filter.should_cancel(
            "https://www.messenger.com/ajax/messaging/typ.php",
            SOURCE,
            ResourceType::Xhr,
            &BlockPrefs::default()
        ));
    }

    #[test]
    fn test_dpr_cookie_appended() {
        assert_eq!(rewrite_dpr_cookie("c_user=1; xs=abc", 2.0), "c_user=1; xs=abc; dpr=2");
    }

    #[test]
    fn test_dpr_cookie_replaced_in_place() {
        assert_eq!(
            rewrite_dpr_cookie("c_user=1; dpr=1; xs=a=b", 1.5),
            "c_user=1; dpr=1.5; xs=a=b"
        );
        assert_eq!(rewrite_dpr_cookie("dpr=1;wd=800x600", 2.0), "dpr=2;wd=800x600");
    }

    #[test]
    fn test_dpr_cookie_ignores_similar_names() {
        assert_eq!(rewrite_dpr_cookie("xdpr=1", 2.0), "xdpr=1; dpr=2");
    }

    #[test]
    fn test_cookie_header_guards() {
        let mut filter = RequestFilter::new();
        let url = "https://www.messenger.com/";

        assert_eq!(filter.rewrite_cookie_header("GET", url, Some("a=1")), None);

        filter.set_display_scales([1.0, 2.0, 1.25]);
        assert_eq!(filter.max_scale_factor(), 2.0);
        assert_eq!(
            filter.rewrite_cookie_header("GET", url, Some("a=1")),
            Some("a=1; dpr=2".to_string())
        );
        assert_eq!(filter.rewrite_cookie_header("POST", url, Some("a=1")), None);
        assert_eq!(filter.rewrite_cookie_header("GET", "https://example.com/", Some("a=1")), None);
        assert_eq!(filter.rewrite_cookie_header("GET", url, None), None);
        assert_eq!(filter.rewrite_cookie_header("GET", url, Some("  ")), None);
    }

    #[test]
    fn test_display_scales_ignore_garbage() {
        let mut filter = RequestFilter::new();
        filter.set_display_scales([f64::NAN, -3.0]);
        assert_eq!(filter.max_scale_factor(), 1.0);
    }

    #[test]
    fn test_ringtone_response() {
        let filter = RequestFilter::new();
        let url = "https://static.xx.fbcdn.net/rsrc.php/yv/r/abc.mp3";

        assert!(filter.should_cancel_response(url, Some(CALL_RINGTONE_MD5), true));
        assert!(!filter.should_cancel_response(url, Some(CALL_RINGTONE_MD5), false));
        assert!(!filter.should_cancel_response(url, Some("other=="), true));
        assert!(!filter.should_cancel_response(url, None, true));
        assert!(!filter.should_cancel_response(
            "https://static.xx.fbcdn.net/images/x.mp3",
            Some(CALL_RINGTONE_MD5),
            true
        ));
    }

    #[test]
    fn test_resource_type_names() {
        assert_eq!(ResourceType::from_name("fetch"), ResourceType::Xhr);
        assert_eq!(ResourceType::from_name("beacon"), ResourceType::Ping);
        assert_eq!(ResourceType::from_name("???"), ResourceType::Other);
    }
}
