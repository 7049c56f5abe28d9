//! Release update checks
//!
//! A background thread asks GitHub for the latest release every few hours and reports a newer
//! version through the event loop. Failures are logged and the next check runs on schedule.

use crate::UserEvent;
use chatwave_core::config::{APP_NAME, LATEST_RELEASE_API};
use chatwave_core::{ChatwaveError, ChatwaveResult};
use serde::Deserialize;
use std::time::Duration;
use tao::event_loop::EventLoopProxy;
use tracing::{debug, info, warn};

/// Interval between update checks
pub const CHECK_INTERVAL: Duration = Duration::from_secs(4 * 60 * 60);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Deserialize)]
struct Release {
    tag_name: String,
    html_url: String,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    prerelease: bool,
}

/// A release newer than the running build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    pub version: String,
    pub url: String,
}

/// Parse `v1.2.3`, `1.2` or `1.2.3-beta` into comparable numbers
fn parse_version(version: &str) -> Option<Vec<u64>> {
    let version = version.trim().trim_start_matches(['v', 'V']);
    let core = version.split(['-', '+']).next()?;
    core.split('.').map(|part| part.parse().ok()).collect()
}

/// Whether `candidate` is a newer version than `current`
pub fn is_newer(candidate: &str, current: &str) -> bool {
    match (parse_version(candidate), parse_version(current)) {
        (Some(mut candidate), Some(mut current)) => {
            let len = candidate.len().max(current.len());
            candidate.resize(len, 0);
            current.resize(len, 0);
            candidate > current
        }
        _ => false,
    }
}

fn fetch_latest() -> ChatwaveResult<Release> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ChatwaveError::network(e.to_string()))?;

    let response = client
        .get(LATEST_RELEASE_API)
        .header("Accept", "application/vnd.github+json")
        .send()
        .map_err(|e| ChatwaveError::network(e.to_string()))?;

    if !response.status().is_success() {
        return Err(ChatwaveError::network(format!(
            "Release check returned {}",
            response.status()
        )));
    }

    response
        .json::<Release>()
        .map_err(|e| ChatwaveError::network(format!("Invalid release response: {}", e)))
}

/// Check once against the running version
pub fn check_for_update() -> ChatwaveResult<Option<UpdateInfo>> {
    let release = fetch_latest()?;
    if release.draft || release.prerelease {
        return Ok(None);
    }

    let current = env!("CARGO_PKG_VERSION");
    if is_newer(&release.tag_name, current) {
        Ok(Some(UpdateInfo {
            version: release.tag_name.trim_start_matches('v').to_string(),
            url: release.html_url,
        }))
    } else {
        debug!("{} is up to date ({})", APP_NAME, current);
        Ok(None)
    }
}

/// Spawn the periodic checker
///
/// Every tick asks the event loop to run a check, so the `autoUpdate` preference is read fresh
/// each time.
pub fn spawn_ticker(proxy: EventLoopProxy<UserEvent>) {
    let spawned = std::thread::Builder::new()
        .name("update-ticker".into())
        .spawn(move || loop {
            if proxy.send_event(UserEvent::UpdateTick).is_err() {
                break;
            }
            std::thread::sleep(CHECK_INTERVAL);
        });

    if let Err(e) = spawned {
        warn!("Failed to spawn update ticker: {}", e);
    }
}

/// Run one check off the event loop thread and report a newer release
pub fn check_in_background(proxy: EventLoopProxy<UserEvent>) {
    let spawned = std::thread::Builder::new()
        .name("update-check".into())
        .spawn(move || match check_for_update() {
            Ok(Some(update)) => {
                info!("Update available: {}", update.version);
                let _ = proxy.send_event(UserEvent::UpdateAvailable(update));
            }
            Ok(None) => {}
            Err(e) => warn!("Update check failed: {}", e),
        });

    if let Err(e) = spawned {
        warn!("Failed to spawn update check: {}", e);
    }
}
