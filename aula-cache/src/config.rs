//! Cache configuration.

use std::time::Duration;

use crate::freshness::Freshness;
use crate::retry::RetryPolicy;

/// How resolutions of overlapping fetches for one key are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseOrdering {
    /// Each fetch is tagged with a per-key sequence number; a resolution
    /// older than the latest issued fetch is discarded.
    #[default]
    LatestIssued,
    /// Whatever resolves last is kept, even if it was issued first.
    LastResolved,
}

/// Configuration for the resource cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Default freshness windows for entries whose bindings set none.
    pub freshness: Freshness,
    /// Interval of the background expiry sweep.
    pub gc_interval: Duration,
    /// Ordering policy for overlapping fetches of one key.
    pub ordering: ResponseOrdering,
    /// Default retry policy for loaders.
    pub retry: RetryPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness: Freshness::default(),
            gc_interval: Duration::from_secs(60),
            ordering: ResponseOrdering::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default stale window.
    pub fn with_stale_after(mut self, duration: Duration) -> Self {
        self.freshness.stale_after = duration;
        self
    }

    /// Set the default expiry window.
    pub fn with_expire_after(mut self, duration: Duration) -> Self {
        self.freshness.expire_after = duration;
        self
    }

    /// Set the sweep interval.
    pub fn with_gc_interval(mut self, duration: Duration) -> Self {
        self.gc_interval = duration;
        self
    }

    pub fn with_ordering(mut self, ordering: ResponseOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
