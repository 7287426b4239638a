//! Lock configuration
//!
//! Defaults match the values deployed grids have always used: a 60 second
//! lock timeout, 10 attempts, 1 to 10 second backoff, and `"Available"` as
//! the free marker.

use crate::error::LockError;
use std::time::Duration;

/// Marker value of a free lock
pub const DEFAULT_AVAILABLE_VALUE: &str = "Available";
/// Age after which a held lock is considered abandoned
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(60);
/// Acquisition attempts before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_BACKOFF_MIN: Duration = Duration::from_secs(1);
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(10);

/// How a network view lock is encoded and retried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockConfig {
    /// EA holding either the free marker or the holder's tenant id
    pub marker_ea: String,
    /// EA holding the Unix time the lock was taken
    pub timestamp_ea: String,
    pub available_value: String,
    pub lock_timeout: Duration,
    pub max_attempts: u32,
    pub backoff_min: Duration,
    pub backoff_max: Duration,
    /// Overall limit on one acquisition, across all attempts
    pub deadline: Option<Duration>,
}

impl LockConfig {
    pub fn new(marker_ea: impl Into<String>, timestamp_ea: impl Into<String>) -> Self {
        Self {
            marker_ea: marker_ea.into(),
            timestamp_ea: timestamp_ea.into(),
            available_value: DEFAULT_AVAILABLE_VALUE.to_string(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_min: DEFAULT_BACKOFF_MIN,
            backoff_max: DEFAULT_BACKOFF_MAX,
            deadline: None,
        }
    }

    #[must_use]
    pub fn with_available_value(mut self, value: impl Into<String>) -> Self {
        self.available_value = value.into();
        self
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, min: Duration, max: Duration) -> Self {
        self.backoff_min = min;
        self.backoff_max = max;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Check the settings are usable
    pub fn validate(&self) -> Result<(), LockError> {
        if self.marker_ea.is_empty() || self.timestamp_ea.is_empty() {
            return Err(LockError::InvalidConfig(
                "marker and timestamp EA names must not be empty".to_string(),
            ));
        }
        if self.marker_ea == self.timestamp_ea {
            return Err(LockError::InvalidConfig(
                "marker and timestamp EAs must differ".to_string(),
            ));
        }
        if self.available_value.is_empty() {
            return Err(LockError::InvalidConfig("available value must not be empty".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(LockError::InvalidConfig("max_attempts must be at least 1".to_string()));
        }
        if self.backoff_min > self.backoff_max {
            return Err(LockError::InvalidConfig(format!(
                "backoff_min ({:?}) exceeds backoff_max ({:?})",
                self.backoff_min, self.backoff_max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LockConfig::new("Lock", "LockTimeout");
        assert_eq!(config.available_value, "Available");
        assert_eq!(config.lock_timeout, Duration::from_secs(60));
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.backoff_min, Duration::from_secs(1));
        assert_eq!(config.backoff_max, Duration::from_secs(10));
        assert!(config.deadline.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let base = LockConfig::new("Lock", "LockTimeout");
        assert!(LockConfig::new("Lock", "Lock").validate().is_err());
        assert!(LockConfig::new("", "LockTimeout").validate().is_err());
        assert!(base.clone().with_max_attempts(0).validate().is_err());
        assert!(base.clone().with_available_value("").validate().is_err());
        assert!(
            base.with_backoff(Duration::from_secs(5), Duration::from_secs(1))
                .validate()
                .is_err()
        );
    }
}
