//! Logging configuration and setup.

use crate::error::{ChatwaveError, ChatwaveResult};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format.
    #[default]
    Pretty,
    /// Compact single-line format.
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level.
    pub level: Level,
    /// Output format.
    pub format: LogFormat,
    /// Include source file location.
    pub include_location: bool,
    /// Custom filter string (e.g., "chatwave=debug,wry=warn").
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            include_location: false,
            filter: None,
        }
    }
}

impl LogConfig {
    /// Create a debug configuration.
    pub fn debug() -> Self {
        Self {
            level: Level::DEBUG,
            include_location: true,
            ..Default::default()
        }
    }

    /// Set a custom filter.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    fn env_filter(&self) -> EnvFilter {
        // RUST_LOG wins over the configured filter
        EnvFilter::try_from_default_env().unwrap_or_else(|_| match self.filter {
            Some(ref custom) => {
                EnvFilter::try_new(custom).unwrap_or_else(|_| EnvFilter::new(self.level.to_string()))
            }
            None => EnvFilter::new(self.level.to_string()),
        })
    }
}

/// Install the global subscriber and route `log` records into it.
pub fn init_logging(config: &LogConfig) -> ChatwaveResult<()> {
    tracing_log::LogTracer::init()
        .map_err(|e| ChatwaveError::config(format!("Failed to set log tracer: {}", e)))?;

    let filter = config.env_filter();
    let result = match config.format {
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_target(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location);
            tracing::subscriber::set_global_default(
                tracing_subscriber::registry().with(filter).with(layer),
            )
        }
        LogFormat::Compact => {
            let layer = fmt::layer().compact().with_target(true);
            tracing::subscriber::set_global_default(
                tracing_subscriber::registry().with(filter).with(layer),
            )
        }
    };

    result.map_err(|e| ChatwaveError::config(format!("Failed to set subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.filter.is_none());
    }

    #[test]
    fn test_with_filter() {
        let config = LogConfig::debug().with_filter("chatwave=trace");
        assert_eq!(config.level, Level::DEBUG);
        assert!(config.include_location);
        assert_eq!(config.filter.as_deref(), Some("chatwave=trace"));
    }
}
