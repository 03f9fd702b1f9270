//! The resource cache.
//!
//! One [`ResourceCache`] is constructed at the application root and cloned
//! into every binding; clones share the same entries. Entries are created on
//! first touch, replaced wholesale on every successful fetch and evicted by
//! the sweep once nothing has observed them for `expire_after`.
//!
//! All entry writes happen under a single lock and are total replacements.
//! Listeners and `watch` receivers are notified after the lock is released,
//! so a listener may read the cache again without deadlocking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use aula_core::{FetchError, Timestamp};
use chrono::Utc;
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::{CacheConfig, ResponseOrdering};
use crate::entry::{CacheEntry, CacheEvent, EntryStatus};
use crate::freshness::Freshness;
use crate::key::CacheKey;
use crate::loader::{erase, ErasedLoader, ErasedValue, Outcome, ResourceLoader};
use crate::retry::RetryPolicy;
use crate::stats::CacheStats;
use crate::subscription::Subscription;

pub(crate) type Listener = Arc<dyn Fn(&CacheEvent) + Send + Sync>;

/// Per-call overrides for [`ResourceCache::fetch_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FetchOptions {
    pub stale_after: Option<Duration>,
    pub expire_after: Option<Duration>,
    pub retry: Option<RetryPolicy>,
    /// Ignore freshness and wait for a new value (explicit refetch). Still
    /// joins a fetch that is already in flight.
    pub force: bool,
}

impl FetchOptions {
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }
}

struct InFlight {
    seq: u64,
    future: Shared<BoxFuture<'static, Outcome>>,
}

struct Slot {
    /// Changes whenever the slot is reset, so resolutions started before a
    /// `remove` can never write into its replacement.
    generation: u64,
    data: Option<ErasedValue>,
    data_version: u64,
    status: EntryStatus,
    error: Option<FetchError>,
    fetched_at: Option<Instant>,
    fetched_wall: Option<Timestamp>,
    invalidated: bool,
    freshness: Freshness,
    loader: Option<ErasedLoader>,
    inflight: Option<InFlight>,
    issued_seq: u64,
    subscribers: usize,
    idle_since: Option<Instant>,
    revision: u64,
    notify: watch::Sender<u64>,
    listeners: Vec<(u64, Listener)>,
}

impl Slot {
    fn new(generation: u64, freshness: Freshness, now: Instant) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            generation,
            data: None,
            data_version: 0,
            status: EntryStatus::Idle,
            error: None,
            fetched_at: None,
            fetched_wall: None,
            invalidated: false,
            freshness,
            loader: None,
            inflight: None,
            issued_seq: 0,
            subscribers: 0,
            idle_since: Some(now),
            revision: 0,
            notify,
            listeners: Vec::new(),
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        self.status == EntryStatus::Success
            && !self.invalidated
            && self
                .fetched_at
                .is_some_and(|fetched_at| self.freshness.is_fresh(fetched_at, now))
    }

    fn snapshot<T>(&self, key: &CacheKey, now: Instant) -> CacheEntry<T>
    where
        T: Send + Sync + 'static,
    {
        let data = self.data.clone().and_then(|value| match value.downcast::<T>() {
            Ok(data) => Some(data),
            Err(_) => {
                tracing::warn!(resource = %key, "Cached value has a different type than requested");
                None
            }
        });
        CacheEntry {
            key: key.clone(),
            data,
            status: self.status,
            error: self.error.clone(),
            fetched_at: self.fetched_wall,
            is_fetching: self.inflight.is_some(),
            is_stale: !self.is_fresh(now),
            stale_after: self.freshness.stale_after,
            expire_after: self.freshness.expire_after,
            data_version: self.data_version,
            subscribers: self.subscribers,
        }
    }

    /// Bump the revision and collect what must be notified once the lock is
    /// released.
    fn touch(&mut self, key: &CacheKey) -> Notification {
        self.revision += 1;
        self.notify.send_replace(self.revision);
        Notification {
            event: CacheEvent {
                key: key.clone(),
                status: self.status,
                is_fetching: self.inflight.is_some(),
                revision: self.revision,
            },
            listeners: self.listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
        }
    }
}

struct Notification {
    event: CacheEvent,
    listeners: Vec<Listener>,
}

impl Notification {
    fn dispatch(self) {
        for listener in &self.listeners {
            listener(&self.event);
        }
    }
}

fn dispatch_all(notes: impl IntoIterator<Item = Notification>) {
    for note in notes {
        note.dispatch();
    }
}

pub(crate) struct CacheInner {
    config: CacheConfig,
    entries: Mutex<HashMap<CacheKey, Slot>>,
    next_generation: AtomicU64,
    next_listener: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
    evictions: AtomicU64,
}

impl CacheInner {
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<CacheKey, Slot>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn new_slot(&self, now: Instant) -> Slot {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        Slot::new(generation, self.config.freshness, now)
    }

    fn slot_mut<'a>(
        &self,
        entries: &'a mut HashMap<CacheKey, Slot>,
        key: &CacheKey,
        now: Instant,
    ) -> &'a mut Slot {
        entries
            .entry(key.clone())
            .or_insert_with(|| self.new_slot(now))
    }

    /// Drop one subscriber (and its listener, if any).
    pub(crate) fn release(&self, key: &CacheKey, listener_id: Option<u64>) {
        let mut entries = self.lock_entries();
        if let Some(slot) = entries.get_mut(key) {
            slot.subscribers = slot.subscribers.saturating_sub(1);
            if slot.subscribers == 0 {
                slot.idle_since = Some(Instant::now());
            }
            if let Some(id) = listener_id {
                slot.listeners.retain(|(lid, _)| *lid != id);
            }
        }
    }

    /// Apply the resolution of fetch `seq` to the entry it was issued for.
    fn apply(&self, key: &CacheKey, generation: u64, seq: u64, outcome: &Outcome) {
        let note = {
            let mut entries = self.lock_entries();
            let Some(slot) = entries.get_mut(key) else {
                tracing::debug!(resource = %key, "Dropping resolution for removed entry");
                return;
            };
            if slot.generation != generation {
                tracing::debug!(resource = %key, "Dropping resolution for reset entry");
                return;
            }
            if slot.inflight.as_ref().is_some_and(|f| f.seq == seq) {
                slot.inflight = None;
            }
            let superseded = match self.config.ordering {
                ResponseOrdering::LatestIssued => seq < slot.issued_seq,
                ResponseOrdering::LastResolved => false,
            };
            if superseded {
                tracing::debug!(
                    resource = %key,
                    seq,
                    latest = slot.issued_seq,
                    "Discarding superseded resolution"
                );
                return;
            }
            match outcome {
                Ok(value) => {
                    slot.data = Some(Arc::clone(value));
                    slot.data_version += 1;
                    slot.status = EntryStatus::Success;
                    slot.error = None;
                    slot.fetched_at = Some(Instant::now());
                    slot.fetched_wall = Some(Utc::now());
                    slot.invalidated = false;
                }
                Err(err) => {
                    slot.status = EntryStatus::Error;
                    slot.error = Some(err.clone());
                }
            }
            slot.touch(key)
        };
        note.dispatch();
    }
}

/// Keyed store of server resource snapshots shared by every binding.
#[derive(Clone)]
pub struct ResourceCache {
    inner: Arc<CacheInner>,
}

impl ResourceCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                config,
                entries: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(1),
                next_listener: AtomicU64::new(1),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                fetches: AtomicU64::new(0),
                evictions: AtomicU64::new(0),
            }),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Current snapshot of `key`, creating an idle entry if none exists.
    pub fn get<T>(&self, key: &CacheKey) -> CacheEntry<T>
    where
        T: Send + Sync + 'static,
    {
        let now = Instant::now();
        let mut entries = self.inner.lock_entries();
        self.inner.slot_mut(&mut entries, key, now).snapshot(key, now)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.lock_entries().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Version of the data held for `key` without creating an entry.
    pub fn data_version(&self, key: &CacheKey) -> u64 {
        self.inner
            .lock_entries()
            .get(key)
            .map_or(0, |slot| slot.data_version)
    }

    /// Register an observer of `key`. Dropping the returned
    /// [`Subscription`] unsubscribes.
    pub fn subscribe(&self, key: &CacheKey) -> Subscription {
        self.subscribe_inner(key, None)
    }

    /// Like [`subscribe`](Self::subscribe), additionally invoking `listener`
    /// on every change of the entry.
    pub fn subscribe_with<F>(&self, key: &CacheKey, listener: F) -> Subscription
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        self.subscribe_inner(key, Some(Arc::new(listener)))
    }

    fn subscribe_inner(&self, key: &CacheKey, listener: Option<Listener>) -> Subscription {
        let now = Instant::now();
        let mut entries = self.inner.lock_entries();
        let slot = self.inner.slot_mut(&mut entries, key, now);
        slot.subscribers += 1;
        slot.idle_since = None;
        let listener_id = listener.map(|listener| {
            let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
            slot.listeners.push((id, listener));
            id
        });
        let receiver = slot.notify.subscribe();
        Subscription::new(Arc::downgrade(&self.inner), key.clone(), listener_id, receiver)
    }

    /// Read `key`, loading it with `loader` when needed.
    ///
    /// Fresh successful data is returned without calling the loader. Stale
    /// data is returned immediately while a background revalidation runs.
    /// Without data the call waits for the load; concurrent callers share
    /// the single in-flight load.
    pub async fn fetch<T, L>(&self, key: &CacheKey, loader: L) -> Result<Arc<T>, FetchError>
    where
        T: Send + Sync + 'static,
        L: ResourceLoader<T> + 'static,
    {
        self.fetch_with(key, Arc::new(loader), FetchOptions::default())
            .await
    }

    pub async fn fetch_with<T>(
        &self,
        key: &CacheKey,
        loader: Arc<dyn ResourceLoader<T>>,
        options: FetchOptions,
    ) -> Result<Arc<T>, FetchError>
    where
        T: Send + Sync + 'static,
    {
        enum Plan {
            Ready(ErasedValue),
            Wait(Shared<BoxFuture<'static, Outcome>>),
        }

        let now = Instant::now();
        let (plan, note) = {
            let mut entries = self.inner.lock_entries();
            let slot = self.inner.slot_mut(&mut entries, key, now);
            self.configure(slot, key, loader, &options);

            let cached = slot.data.clone();
            match cached {
                Some(data) if !options.force && slot.is_fresh(now) => {
                    self.inner.hits.fetch_add(1, Ordering::Relaxed);
                    (Plan::Ready(data), None)
                }
                cached => {
                    self.inner.misses.fetch_add(1, Ordering::Relaxed);
                    let joined = slot.inflight.as_ref().map(|f| f.future.clone());
                    let (shared, note) = match joined {
                        Some(shared) => (shared, None),
                        None => {
                            let (shared, note) = self.start_fetch(slot, key);
                            (shared, Some(note))
                        }
                    };
                    match cached {
                        Some(data) if !options.force => (Plan::Ready(data), note),
                        _ => (Plan::Wait(shared), note),
                    }
                }
            }
        };
        if let Some(note) = note {
            note.dispatch();
        }

        let value = match plan {
            Plan::Ready(value) => value,
            Plan::Wait(shared) => shared.await?,
        };
        value.downcast::<T>().map_err(|_| {
            FetchError::decode(format!("cached value for {} has a different type", key))
        })
    }

    /// Start a background load of `key` unless it is fresh or already
    /// loading. Returns whether a load was started; outside a Tokio runtime
    /// nothing could drive it, so only the loader is registered.
    pub fn prefetch<T>(
        &self,
        key: &CacheKey,
        loader: Arc<dyn ResourceLoader<T>>,
        options: FetchOptions,
    ) -> bool
    where
        T: Send + Sync + 'static,
    {
        let now = Instant::now();
        let note = {
            let mut entries = self.inner.lock_entries();
            let slot = self.inner.slot_mut(&mut entries, key, now);
            self.configure(slot, key, loader, &options);
            if slot.inflight.is_some() || (!options.force && slot.is_fresh(now)) {
                None
            } else if !has_runtime() {
                tracing::debug!(resource = %key, "No runtime available; prefetch skipped");
                None
            } else {
                Some(self.start_fetch(slot, key).1)
            }
        };
        match note {
            Some(note) => {
                note.dispatch();
                true
            }
            None => false,
        }
    }

    /// Mark every entry matching `pattern` stale. Entries with at least one
    /// subscriber are refetched in the background right away; the rest are
    /// reloaded lazily on their next read. Returns the number of matches.
    pub fn invalidate(&self, pattern: &CacheKey) -> usize {
        let background = has_runtime();
        let mut notes = Vec::new();
        let mut matched = 0;
        {
            let mut entries = self.inner.lock_entries();
            for (key, slot) in entries.iter_mut() {
                if !key.matches(pattern) {
                    continue;
                }
                matched += 1;
                slot.invalidated = true;
                if slot.subscribers > 0 && slot.loader.is_some() && background {
                    // A load issued before the invalidation may predate the
                    // write that caused it; start a new one instead of
                    // joining it.
                    notes.push(self.start_fetch(slot, key).1);
                } else {
                    notes.push(slot.touch(key));
                }
            }
        }
        tracing::debug!(pattern = %pattern, matched, "Invalidated cache entries");
        dispatch_all(notes);
        matched
    }

    pub fn invalidate_all(&self) -> usize {
        let background = has_runtime();
        let mut notes = Vec::new();
        let mut matched = 0;
        {
            let mut entries = self.inner.lock_entries();
            for (key, slot) in entries.iter_mut() {
                matched += 1;
                slot.invalidated = true;
                if slot.subscribers > 0 && slot.loader.is_some() && background {
                    notes.push(self.start_fetch(slot, key).1);
                } else {
                    notes.push(slot.touch(key));
                }
            }
        }
        dispatch_all(notes);
        matched
    }

    /// Delete `key` so stale reads never resurrect a resource deleted
    /// server-side. If the key is still observed, the entry is reset to idle
    /// in place and its subscribers are notified; a load that was in flight
    /// can no longer write to it.
    pub fn remove(&self, key: &CacheKey) -> bool {
        let note = {
            let mut entries = self.inner.lock_entries();
            let Some(subscribers) = entries.get(key).map(|slot| slot.subscribers) else {
                return false;
            };
            if subscribers == 0 {
                entries.remove(key);
                None
            } else {
                let mut fresh = self.inner.new_slot(Instant::now());
                match entries.get_mut(key) {
                    Some(slot) => {
                        fresh.freshness = slot.freshness;
                        fresh.subscribers = slot.subscribers;
                        fresh.idle_since = None;
                        fresh.revision = slot.revision;
                        fresh.listeners = std::mem::take(&mut slot.listeners);
                        std::mem::swap(&mut fresh.notify, &mut slot.notify);
                        *slot = fresh;
                        Some(slot.touch(key))
                    }
                    None => None,
                }
            }
        };
        tracing::debug!(resource = %key, "Removed cache entry");
        if let Some(note) = note {
            note.dispatch();
        }
        true
    }

    /// Evict entries that have had no subscriber for longer than their
    /// `expire_after`. Returns the number of evicted entries.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.inner.lock_entries();
        let before = entries.len();
        entries.retain(|key, slot| {
            let keep = slot.subscribers > 0
                || slot.inflight.is_some()
                || slot
                    .idle_since
                    .map_or(true, |idle_since| !slot.freshness.is_expired(idle_since, now));
            if !keep {
                tracing::trace!(resource = %key, "Evicting expired cache entry");
            }
            keep
        });
        let evicted = before - entries.len();
        if evicted > 0 {
            self.inner
                .evictions
                .fetch_add(evicted as u64, Ordering::Relaxed);
            tracing::debug!(evicted, remaining = entries.len(), "Cache sweep completed");
        }
        evicted
    }

    /// Run [`sweep`](Self::sweep) every `gc_interval` until the last clone
    /// of the cache is dropped. Must be called within a Tokio runtime.
    pub fn spawn_gc(&self) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        let period = self.inner.config.gc_interval.max(Duration::from_millis(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                ResourceCache { inner }.sweep();
            }
        })
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            fetches: self.inner.fetches.load(Ordering::Relaxed),
            evictions: self.inner.evictions.load(Ordering::Relaxed),
            entry_count: self.len() as u64,
        }
    }

    fn configure<T>(
        &self,
        slot: &mut Slot,
        key: &CacheKey,
        loader: Arc<dyn ResourceLoader<T>>,
        options: &FetchOptions,
    ) where
        T: Send + Sync + 'static,
    {
        let retry = options.retry.unwrap_or(self.inner.config.retry);
        slot.loader = Some(erase(key.clone(), loader, retry));
        if let Some(stale_after) = options.stale_after {
            slot.freshness.stale_after = stale_after;
        }
        if let Some(expire_after) = options.expire_after {
            slot.freshness.expire_after = expire_after;
        }
    }

    /// Issue a new load for `slot`. The load is spawned so it completes and
    /// updates the entry even if every waiter goes away.
    fn start_fetch(
        &self,
        slot: &mut Slot,
        key: &CacheKey,
    ) -> (Shared<BoxFuture<'static, Outcome>>, Notification) {
        slot.issued_seq += 1;
        let seq = slot.issued_seq;
        let generation = slot.generation;
        if slot.data.is_none() {
            slot.status = EntryStatus::Loading;
        }

        let weak = Arc::downgrade(&self.inner);
        let loader = slot.loader.clone();
        let target = key.clone();
        let future = async move {
            let outcome = match loader {
                Some(loader) => (*loader)().await,
                None => Err(FetchError::network(format!("no loader registered for {}", target))),
            };
            if let Some(inner) = weak.upgrade() {
                inner.apply(&target, generation, seq, &outcome);
            }
            outcome
        }
        .boxed()
        .shared();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(future.clone());
            }
            Err(_) => {
                tracing::warn!(resource = %key, "No runtime available; load runs when awaited");
            }
        }

        self.inner.fetches.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(resource = %key, seq, "Started resource load");
        slot.inflight = Some(InFlight {
            seq,
            future: future.clone(),
        });
        (future, slot.touch(key))
    }
}

/// Background loads are spawned; without a runtime they would never run.
fn has_runtime() -> bool {
    tokio::runtime::Handle::try_current().is_ok()
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("entries", &self.len())
            .field("config", &self.inner.config)
            .finish()
    }
}
