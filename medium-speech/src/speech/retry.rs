//! Retry policy for transient synthesis failures.

use std::time::Duration;
use tts_client::TtsError;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// A policy that never retries.
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before retry number `retry` (0-based), capped at `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.backoff_factor.powi(retry as i32);
        let secs = (self.initial_delay.as_secs_f32() * factor).min(self.max_delay.as_secs_f32());
        Duration::from_secs_f32(secs)
    }

    /// Delay before retry number `retry` after `error`. A server-provided
    /// Retry-After wins when it is longer than the backoff.
    pub fn delay_after(&self, retry: u32, error: &TtsError) -> Duration {
        let backoff = self.delay_for(retry);
        match error {
            TtsError::RateLimited {
                retry_after: Some(secs),
            } => backoff.max(Duration::from_secs(*secs)),
            _ => backoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retry_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.initial_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_backoff_is_capped() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for(0), Duration::from_secs(1));
        assert_eq!(config.delay_for(1), Duration::from_secs(2));
        assert_eq!(config.delay_for(2), Duration::from_secs(4));
        assert_eq!(config.delay_for(10), Duration::from_secs(30));
    }

    #[test]
    fn test_retry_after_extends_backoff() {
        let config = RetryConfig::default();
        let limited = TtsError::RateLimited {
            retry_after: Some(7),
        };
        assert_eq!(config.delay_after(0, &limited), Duration::from_secs(7));
        assert_eq!(config.delay_after(3, &limited), Duration::from_secs(8));
    }

    #[test]
    fn test_delay_after_without_hint_uses_backoff() {
        let config = RetryConfig::default();
        let limited = TtsError::RateLimited { retry_after: None };
        let server = TtsError::ServerError {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(config.delay_after(1, &limited), Duration::from_secs(2));
        assert_eq!(config.delay_after(1, &server), Duration::from_secs(2));
    }
}
