//! Error types for Chatwave

use thiserror::Error;

/// Result type alias for Chatwave operations
pub type ChatwaveResult<T> = Result<T, ChatwaveError>;

/// Main error type for Chatwave
#[derive(Error, Debug)]
pub enum ChatwaveError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Preference error: {0}")]
    Preference(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("WebView error: {0}")]
    WebView(String),

    #[error("Window error: {0}")]
    Window(String),

    #[error("Menu error: {0}")]
    Menu(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Instance lock error: {0}")]
    Instance(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChatwaveError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new preference error
    pub fn preference(msg: impl Into<String>) -> Self {
        Self::Preference(msg.into())
    }

    /// Create a new network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a new WebView error
    pub fn webview(msg: impl Into<String>) -> Self {
        Self::WebView(msg.into())
    }

    /// Create a new window error
    pub fn window(msg: impl Into<String>) -> Self {
        Self::Window(msg.into())
    }

    pub fn menu(msg: impl Into<String>) -> Self {
        Self::Menu(msg.into())
    }

    pub fn notification(msg: impl Into<String>) -> Self {
        Self::Notification(msg.into())
    }

    /// Create a new single-instance error
    pub fn instance(msg: impl Into<String>) -> Self {
        Self::Instance(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helper_constructors() {
        assert!(matches!(ChatwaveError::config("x"), ChatwaveError::Config(ref m) if m == "x"));
        assert_eq!(
            ChatwaveError::preference("bad key").to_string(),
            "Preference error: bad key"
        );
    }

    #[test]
    fn test_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ChatwaveError = io.into();
        assert!(err.to_string().starts_with("IO error"));
    }
}
