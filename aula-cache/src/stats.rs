//! Cache usage counters.

/// Snapshot of the cache counters, taken by [`ResourceCache::stats`].
///
/// [`ResourceCache::stats`]: crate::ResourceCache::stats
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads answered from a fresh entry without touching the loader.
    pub hits: u64,
    /// Reads that had to start or join a load (including stale reads
    /// answered immediately while revalidating).
    pub misses: u64,
    /// Loader invocations started.
    pub fetches: u64,
    /// Entries removed by the expiry sweep.
    pub evictions: u64,
    /// Entries present when the snapshot was taken.
    pub entry_count: u64,
}

impl CacheStats {
    /// Share of reads served fresh, in `0.0..=1.0`.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
