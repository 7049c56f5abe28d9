//! Chatwave Core Library
//!
//! This crate provides shared types, errors, preferences and configuration for Chatwave.

pub mod config;
pub mod error;
pub mod logging;
pub mod prefs;
pub mod retry;
pub mod types;

pub use config::AppPaths;
pub use error::{ChatwaveError, ChatwaveResult};
pub use prefs::{BoolPref, PreferenceStore, Preferences};
pub use types::Platform;
