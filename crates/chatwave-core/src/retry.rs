//! Retry with exponential backoff for blocking operations.

use rand::Rng;
use std::thread::sleep;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (1 = no retries).
    pub max_attempts: u32,
    /// Initial delay between retries.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier (e.g., 2.0 for exponential).
    pub backoff_multiplier: f64,
    /// Add jitter to delays.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a config for no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Startup connectivity gate: roughly half a minute before giving up.
    pub fn connectivity() -> Self {
        Self {
            max_attempts: 6,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    /// Calculate delay for a given attempt (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }

        let base_delay =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi((attempt - 2) as i32);

        let delay = Duration::from_secs_f64(base_delay.min(self.max_delay.as_secs_f64()));

        if self.jitter {
            // Up to 25% extra
            let jitter = delay.as_secs_f64() * rand::thread_rng().gen_range(0.0..0.25);
            delay + Duration::from_secs_f64(jitter)
        } else {
            delay
        }
    }
}

/// Retry a fallible blocking operation with exponential backoff.
///
/// Returns the last error once `max_attempts` is exhausted.
pub fn retry_with_backoff<T, E, F>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Result<T, E>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        if attempt > 1 {
            let delay = config.delay_for_attempt(attempt);
            debug!(attempt, ?delay, "Retrying after delay");
            sleep(delay);
        }

        match operation(attempt) {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Operation succeeded after retries");
                }
                return Ok(value);
            }
            Err(e) => {
                warn!(attempt, max_attempts, error = %e, "Operation failed");
                if attempt >= max_attempts {
                    return Err(e);
                }
            }
        }

        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    #[test]
    fn test_retry_config_none() {
        assert_eq!(RetryConfig::none().max_attempts, 1);
    }

    #[test]
    fn test_delay_for_attempt() {
        let config = RetryConfig {
            jitter: false,
            ..Default::default()
        };

        assert_eq!(config.delay_for_attempt(1), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_respects_max() {
        let config = RetryConfig {
            initial_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(15),
            jitter: false,
            ..Default::default()
        };

        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(10));
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(15));
    }

    #[test]
    fn test_jitter_stays_within_quarter() {
        let config = RetryConfig::default();
        let delay = config.delay_for_attempt(2);
        assert!(delay >= Duration::from_millis(100));
        assert!(delay <= Duration::from_millis(125));
    }

    #[test]
    fn test_retry_succeeds_after_failures() {
        let mut calls = 0;
        let result: Result<u32, String> = retry_with_backoff(&fast(), |attempt| {
            calls += 1;
            if attempt < 3 {
                Err(format!("attempt {} failed", attempt))
            } else {
                Ok(attempt)
            }
        });

        assert_eq!(result, Ok(3));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_retry_returns_last_error() {
        let mut calls = 0;
        let result: Result<(), String> = retry_with_backoff(&fast(), |attempt| {
            calls += 1;
            Err(format!("attempt {}", attempt))
        });

        assert_eq!(result, Err("attempt 3".to_string()));
        assert_eq!(calls, 3);
    }
}
