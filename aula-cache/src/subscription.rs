//! Observer handles for cache entries.

use std::sync::Weak;

use tokio::sync::watch;

use crate::cache::CacheInner;
use crate::key::CacheKey;

/// Keeps an entry observed while alive.
///
/// An observed entry is never evicted, and invalidating it triggers an
/// immediate background refetch. Dropping the handle unsubscribes.
pub struct Subscription {
    cache: Weak<CacheInner>,
    key: CacheKey,
    listener_id: Option<u64>,
    receiver: watch::Receiver<u64>,
}

impl Subscription {
    pub(crate) fn new(
        cache: Weak<CacheInner>,
        key: CacheKey,
        listener_id: Option<u64>,
        receiver: watch::Receiver<u64>,
    ) -> Self {
        Self {
            cache,
            key,
            listener_id,
            receiver,
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Revision of the entry last observed through this handle.
    pub fn revision(&self) -> u64 {
        *self.receiver.borrow()
    }

    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Wait until the entry changes. Returns `false` once the cache is gone.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    pub fn mark_seen(&mut self) {
        self.receiver.borrow_and_update();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cache) = self.cache.upgrade() {
            cache.release(&self.key, self.listener_id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("revision", &self.revision())
            .finish()
    }
}
