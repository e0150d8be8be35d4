//! Transport-level retry policy.

use std::time::Duration;

/// How many times a transport re-sends a request that failed transiently.
///
/// The default makes a single attempt. Touch writes and filtered deletes are
/// idempotent, so a re-sent request cannot apply twice; the reconciler still
/// never retries on its own and surfaces the first failure it sees.
///
/// ```rust
/// use spicedb_relationship::RetryConfig;
/// use std::time::Duration;
///
/// assert!(!RetryConfig::default().is_enabled());
///
/// let retry = RetryConfig::with_retries(3)
///     .backoff(Duration::from_millis(50), Duration::from_secs(2));
/// assert!(retry.is_enabled());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Re-sends after the first attempt. Zero disables retries.
    pub max_retries: u32,
    /// Backoff ceiling for the first retry; doubles per retry.
    pub base_delay: Duration,
    /// Upper bound on any single backoff.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    /// Allows up to `max_retries` re-sends with the default backoff.
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Sets the backoff bounds.
    #[must_use]
    pub fn backoff(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    /// Returns `true` if any retry is allowed.
    pub fn is_enabled(&self) -> bool {
        self.max_retries > 0
    }

    /// Full-jitter backoff before retry number `retry` (1-based): a uniform
    /// draw from zero to `base_delay * 2^(retry - 1)`, capped at `max_delay`.
    pub(crate) fn backoff_for(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(31);
        let ceiling = self
            .base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay);
        ceiling.mul_f64(fastrand::f64())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_single_attempt() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 0);
        assert!(!config.is_enabled());
    }

    #[test]
    fn test_with_retries_keeps_default_backoff() {
        let config = RetryConfig::with_retries(2);
        assert!(config.is_enabled());
        assert_eq!(config.base_delay, RetryConfig::default().base_delay);
    }

    #[test]
    fn test_backoff_bounded_by_doubling_ceiling() {
        let config = RetryConfig::with_retries(5)
            .backoff(Duration::from_millis(10), Duration::from_secs(1));

        for _ in 0..50 {
            assert!(config.backoff_for(1) <= Duration::from_millis(10));
            assert!(config.backoff_for(3) <= Duration::from_millis(40));
        }
    }

    #[test]
    fn test_backoff_capped_at_max() {
        let config = RetryConfig::with_retries(64)
            .backoff(Duration::from_secs(1), Duration::from_secs(3));

        for retry in [10, 40, u32::MAX] {
            assert!(config.backoff_for(retry) <= Duration::from_secs(3));
        }
    }

    #[test]
    fn test_zero_base_means_no_wait() {
        let config = RetryConfig::with_retries(1).backoff(Duration::ZERO, Duration::ZERO);
        assert_eq!(config.backoff_for(1), Duration::ZERO);
    }
}
