//! Query binding: a view component's handle on one cache key.

use std::sync::Arc;
use std::time::Duration;

use aula_core::{FetchError, Timestamp};

use crate::cache::{FetchOptions, ResourceCache};
use crate::entry::EntryStatus;
use crate::key::CacheKey;
use crate::loader::ResourceLoader;
use crate::overlay::Overlay;
use crate::retry::RetryPolicy;
use crate::subscription::Subscription;

/// Options for a mounted query. Unset windows fall back to the cache
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryOptions {
    /// A disabled query subscribes but never loads on its own.
    pub enabled: bool,
    pub stale_after: Option<Duration>,
    pub expire_after: Option<Duration>,
    pub retry: Option<RetryPolicy>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            stale_after: None,
            expire_after: None,
            retry: None,
        }
    }
}

impl QueryOptions {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_stale_after(mut self, duration: Duration) -> Self {
        self.stale_after = Some(duration);
        self
    }

    pub fn with_expire_after(mut self, duration: Duration) -> Self {
        self.expire_after = Some(duration);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    fn fetch_options(&self, force: bool) -> FetchOptions {
        FetchOptions {
            stale_after: self.stale_after,
            expire_after: self.expire_after,
            retry: self.retry,
            force,
        }
    }
}

/// What a view renders for a query.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub key: CacheKey,
    /// Optimistic value when an overlay is active, otherwise cached data.
    pub data: Option<Arc<T>>,
    pub status: EntryStatus,
    pub error: Option<FetchError>,
    /// No data yet and a load is running.
    pub is_loading: bool,
    /// Any load is running, including background revalidation.
    pub is_fetching: bool,
    pub is_stale: bool,
    pub is_optimistic: bool,
    pub updated_at: Option<Timestamp>,
}

impl<T> QueryState<T> {
    pub fn is_success(&self) -> bool {
        self.status == EntryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == EntryStatus::Error
    }
}

/// Subscription to one cache key plus the loader that fills it.
///
/// Mounting subscribes and starts a load if the entry is missing or stale.
/// Dropping the query unsubscribes; the entry then ages out after its
/// `expire_after`.
pub struct Query<T> {
    cache: ResourceCache,
    key: CacheKey,
    loader: Arc<dyn ResourceLoader<T>>,
    options: QueryOptions,
    overlay: Overlay<T>,
    subscription: Subscription,
}

impl<T> Query<T>
where
    T: Send + Sync + 'static,
{
    pub fn mount<L>(cache: &ResourceCache, key: CacheKey, loader: L, options: QueryOptions) -> Self
    where
        L: ResourceLoader<T> + 'static,
    {
        Self::mount_shared(cache, key, Arc::new(loader), options)
    }

    pub fn mount_shared(
        cache: &ResourceCache,
        key: CacheKey,
        loader: Arc<dyn ResourceLoader<T>>,
        options: QueryOptions,
    ) -> Self {
        let subscription = cache.subscribe(&key);
        let query = Self {
            cache: cache.clone(),
            overlay: Overlay::new(cache, key.clone()),
            key,
            loader,
            options,
            subscription,
        };
        query.ensure_fresh();
        query
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn is_enabled(&self) -> bool {
        self.options.enabled
    }

    /// Optimistic layer for this query's key; mutations write here.
    pub fn overlay(&self) -> &Overlay<T> {
        &self.overlay
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.options.enabled = enabled;
        self.ensure_fresh();
    }

    /// Start a background load if the query is enabled and its entry is
    /// missing or stale. Returns whether a load was started.
    pub fn ensure_fresh(&self) -> bool {
        if !self.options.enabled {
            return false;
        }
        self.cache.prefetch(
            &self.key,
            Arc::clone(&self.loader),
            self.options.fetch_options(false),
        )
    }

    pub fn state(&self) -> QueryState<T> {
        let entry = self.cache.get::<T>(&self.key);
        let optimistic = self.overlay.current();
        QueryState {
            key: entry.key,
            is_loading: entry.data.is_none() && entry.is_fetching,
            is_optimistic: optimistic.is_some(),
            data: optimistic.or(entry.data),
            status: entry.status,
            error: entry.error,
            is_fetching: entry.is_fetching,
            is_stale: entry.is_stale,
            updated_at: entry.fetched_at,
        }
    }

    /// Load again regardless of freshness and wait for the result.
    pub async fn refetch(&self) -> Result<Arc<T>, FetchError> {
        self.cache
            .fetch_with(
                &self.key,
                Arc::clone(&self.loader),
                self.options.fetch_options(true),
            )
            .await
    }

    /// Wait until the entry changes. Returns `false` once the cache is gone.
    pub async fn changed(&mut self) -> bool {
        self.subscription.changed().await
    }

    pub fn has_changed(&self) -> bool {
        self.subscription.has_changed()
    }

    pub fn mark_seen(&mut self) {
        self.subscription.mark_seen();
    }

    /// Rebind to another key (for example a detail view switching records).
    /// The new subscription is taken before the old one is released.
    pub fn set_key<L>(&mut self, key: CacheKey, loader: L)
    where
        L: ResourceLoader<T> + 'static,
    {
        if key == self.key {
            return;
        }
        self.subscription = self.cache.subscribe(&key);
        self.overlay = Overlay::new(&self.cache, key.clone());
        self.loader = Arc::new(loader);
        self.key = key;
        self.ensure_fresh();
    }
}

impl<T> std::fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("key", &self.key)
            .field("options", &self.options)
            .finish()
    }
}
