//! Tracking parameter and redirect-wrapper removal for outbound links

use url::Url;

/// Link shim hosts that wrap the real destination in a `u` parameter
const REDIRECT_HOSTS: &[&str] = &["l.messenger.com", "l.facebook.com", "lm.facebook.com"];

/// Query parameters removed outright
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "dclid", "gbraid", "wbraid", "msclkid", "mc_eid", "igshid", "yclid",
    "_hsenc", "_hsmi",
];

/// Query parameter prefixes removed outright
const TRACKING_PREFIXES: &[&str] = &["utm_", "__cft__", "__tn__"];

/// Strip redirect wrappers and tracking parameters from a URL
///
/// Input that does not parse, or has nothing to strip, is returned unchanged, so applying this
/// twice gives the same result as applying it once.
pub fn strip_tracking(input: &str) -> String {
    let mut url = match Url::parse(input) {
        Ok(url) => url,
        Err(_) => return input.to_string(),
    };

    let mut changed = false;

    // Every unwrap yields a strictly shorter URL, so this terminates
    while let Some(target) = unwrap_redirect(&url) {
        url = target;
        changed = true;
    }

    if remove_tracking_params(&mut url) {
        changed = true;
    }

    if changed {
        url.to_string()
    } else {
        input.to_string()
    }
}

/// Whether a query parameter name is a known tracker
pub fn is_tracking_param(name: &str) -> bool {
    TRACKING_PARAMS.contains(&name) || TRACKING_PREFIXES.iter().any(|p| name.starts_with(p))
}

fn unwrap_redirect(url: &Url) -> Option<Url> {
    let host = url.host_str()?;
    if !REDIRECT_HOSTS.contains(&host) || url.path() != "/l.php" {
        return None;
    }

    let target = url
        .query_pairs()
        .find(|(name, _)| name == "u")
        .map(|(_, value)| value.into_owned())?;

    let target = Url::parse(&target).ok()?;
    matches!(target.scheme(), "http" | "https").then_some(target)
}

fn remove_tracking_params(url: &mut Url) -> bool {
    if url.query().is_none() {
        return false;
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let kept: Vec<&(String, String)> = pairs
        .iter()
        .filter(|(name, _)| !is_tracking_param(name))
        .collect();

    if kept.len() == pairs.len() {
        return false;
    }

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    true
}
