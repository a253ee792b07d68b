//! Configuration for the session store.

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default interval between periodic expiration sweeps.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for the session store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of live sessions before the least recently accessed
    /// one is evicted. `None` means unbounded.
    pub max_sessions: Option<NonZeroUsize>,

    /// Inactivity window after which a session is considered expired.
    /// `None` means sessions never expire by time.
    pub ttl: Option<Duration>,

    /// Interval between periodic sweeps of expired sessions.
    /// Only relevant when `ttl` is set.
    pub cleanup_interval: Duration,

    /// Whether to run the periodic sweep task. If false, expired sessions
    /// are only removed when an operation touches them.
    pub enable_cleanup_task: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_sessions: None,
            ttl: None,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            enable_cleanup_task: true,
        }
    }
}

impl StoreConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of live sessions. A value of 0 means
    /// unbounded.
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = NonZeroUsize::new(max);
        self
    }

    /// Set the session TTL. A zero duration means sessions never expire.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = if ttl.is_zero() { None } else { Some(ttl) };
        self
    }

    /// Disable TTL (sessions don't expire based on time).
    pub fn without_ttl(mut self) -> Self {
        self.ttl = None;
        self
    }

    /// Set the interval between periodic sweeps.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Enable or disable the background sweep task.
    pub fn with_cleanup_task(mut self, enabled: bool) -> Self {
        self.enable_cleanup_task = enabled;
        self
    }

    /// Validate the configuration.
    ///
    /// Negative values are unrepresentable here, so the remaining invalid
    /// state is a zero sweep interval, which would make the sweep task spin.
    pub fn validate(&self) -> Result<()> {
        if self.cleanup_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "cleanup_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_unbounded_and_non_expiring() {
        let config = StoreConfig::default();
        assert!(config.max_sessions.is_none());
        assert!(config.ttl.is_none());
        assert_eq!(config.cleanup_interval, DEFAULT_CLEANUP_INTERVAL);
        assert!(config.enable_cleanup_task);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_max_sessions_means_unbounded() {
        let config = StoreConfig::new().with_max_sessions(0);
        assert!(config.max_sessions.is_none());

        let config = StoreConfig::new().with_max_sessions(5);
        assert_eq!(config.max_sessions.map(|n| n.get()), Some(5));
    }

    #[test]
    fn test_zero_ttl_means_never_expires() {
        let config = StoreConfig::new().with_ttl(Duration::ZERO);
        assert!(config.ttl.is_none());

        let config = StoreConfig::new().with_ttl(Duration::from_secs(30));
        assert_eq!(config.ttl, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_zero_cleanup_interval_is_rejected() {
        let config = StoreConfig::new().with_cleanup_interval(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
