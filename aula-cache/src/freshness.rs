//! Freshness windows for cache entries.
//!
//! Every entry carries two windows: `stale_after` decides when a cached value
//! must be revalidated on the next read, `expire_after` decides how long an
//! entry with no subscribers survives before the sweep evicts it.

use std::time::Duration;
use tokio::time::Instant;

/// Staleness and expiry windows for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Freshness {
    /// Age after which a successful value is considered stale.
    pub stale_after: Duration,
    /// How long an unobserved entry is kept before eviction.
    pub expire_after: Duration,
}

impl Freshness {
    pub fn new(stale_after: Duration, expire_after: Duration) -> Self {
        Self {
            stale_after,
            expire_after,
        }
    }

    /// Whether a value fetched at `fetched_at` is still fresh at `now`.
    ///
    /// A zero `stale_after` means "always stale": every read revalidates.
    pub fn is_fresh(&self, fetched_at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(fetched_at) < self.stale_after
    }

    /// Whether an entry idle since `idle_since` may be evicted at `now`.
    pub fn is_expired(&self, idle_since: Instant, now: Instant) -> bool {
        now.saturating_duration_since(idle_since) >= self.expire_after
    }
}

impl Default for Freshness {
    fn default() -> Self {
        Self {
            stale_after: Duration::ZERO,
            expire_after: Duration::from_secs(300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_stale_after_is_always_stale() {
        let freshness = Freshness::new(Duration::ZERO, Duration::from_secs(60));
        let now = Instant::now();
        assert!(!freshness.is_fresh(now, now));
    }

    #[test]
    fn test_fresh_until_window_elapses() {
        let freshness = Freshness::new(Duration::from_secs(30), Duration::from_secs(60));
        let fetched_at = Instant::now();
        assert!(freshness.is_fresh(fetched_at, fetched_at + Duration::from_secs(29)));
        assert!(!freshness.is_fresh(fetched_at, fetched_at + Duration::from_secs(30)));
    }

    #[test]
    fn test_expiry_window() {
        let freshness = Freshness::new(Duration::ZERO, Duration::from_secs(60));
        let idle_since = Instant::now();
        assert!(!freshness.is_expired(idle_since, idle_since + Duration::from_secs(59)));
        assert!(freshness.is_expired(idle_since, idle_since + Duration::from_secs(60)));
    }

    #[test]
    fn test_default_windows() {
        let freshness = Freshness::default();
        assert_eq!(freshness.stale_after, Duration::ZERO);
        assert_eq!(freshness.expire_after, Duration::from_secs(300));
    }
}
