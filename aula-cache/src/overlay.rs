//! Optimistic overlays.
//!
//! Cached data is only ever written by fetch resolutions. A mutation that
//! wants to show its effect before the server confirms it adds a step to an
//! [`Overlay`] instead: the visible value is the cached value with every
//! live step applied in order. Rolling a step back removes only that step,
//! so overlapping mutations on one key settle independently.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::cache::ResourceCache;
use crate::key::CacheKey;

type Update<T> = Arc<dyn Fn(&T) -> T + Send + Sync>;

/// Identifies one applied step for [`Overlay::rollback`] and
/// [`Overlay::confirm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepId(u64);

struct Step<T> {
    id: StepId,
    update: Update<T>,
    /// Data version at confirmation. A confirmed step is dropped as soon as
    /// the cached data moves past it.
    confirmed_at: Option<u64>,
}

struct Computed<T> {
    version: u64,
    revision: u64,
    value: Arc<T>,
}

struct Layer<T> {
    steps: Vec<Step<T>>,
    revision: u64,
    computed: Option<Computed<T>>,
}

impl<T> Default for Layer<T> {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            revision: 0,
            computed: None,
        }
    }
}

impl<T> Layer<T> {
    fn changed(&mut self) {
        self.revision += 1;
        self.computed = None;
    }

    fn discard_settled(&mut self, version: u64) {
        let before = self.steps.len();
        self.steps
            .retain(|step| step.confirmed_at.map_or(true, |at| at == version));
        if self.steps.len() != before {
            self.changed();
        }
    }
}

/// Optimistic steps over one cache entry. Clones share the steps.
pub struct Overlay<T> {
    cache: ResourceCache,
    key: CacheKey,
    layer: Arc<Mutex<Layer<T>>>,
    next_step: Arc<AtomicU64>,
}

impl<T> Clone for Overlay<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            key: self.key.clone(),
            layer: Arc::clone(&self.layer),
            next_step: Arc::clone(&self.next_step),
        }
    }
}

impl<T> Overlay<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(cache: &ResourceCache, key: CacheKey) -> Self {
        Self {
            cache: cache.clone(),
            key,
            layer: Arc::new(Mutex::new(Layer::default())),
            next_step: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    fn lock(&self) -> MutexGuard<'_, Layer<T>> {
        self.layer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The cached value with every live step applied, or `None` when no
    /// step is live or there is no cached value to apply them to.
    pub fn current(&self) -> Option<Arc<T>> {
        let base = self.cache.get::<T>(&self.key).data?;
        let version = self.cache.data_version(&self.key);
        let mut layer = self.lock();
        layer.discard_settled(version);
        if layer.steps.is_empty() {
            return None;
        }
        if let Some(computed) = &layer.computed {
            if computed.version == version && computed.revision == layer.revision {
                return Some(Arc::clone(&computed.value));
            }
        }
        let mut steps = layer.steps.iter();
        let first = steps.next()?;
        let value = Arc::new(steps.fold((first.update)(&base), |acc, step| (step.update)(&acc)));
        let revision = layer.revision;
        layer.computed = Some(Computed {
            version,
            revision,
            value: Arc::clone(&value),
        });
        Some(value)
    }

    pub fn is_active(&self) -> bool {
        self.current().is_some()
    }

    /// Number of steps not yet rolled back or superseded by fresh data.
    pub fn step_count(&self) -> usize {
        let version = self.cache.data_version(&self.key);
        let mut layer = self.lock();
        layer.discard_settled(version);
        layer.steps.len()
    }

    /// Add `update` on top of the live steps. Returns `None` when there is
    /// no cached value yet.
    pub fn apply<F>(&self, update: F) -> Option<StepId>
    where
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        self.cache.get::<T>(&self.key).data?;
        let id = StepId(self.next_step.fetch_add(1, Ordering::SeqCst));
        let mut layer = self.lock();
        layer.steps.push(Step {
            id,
            update: Arc::new(update),
            confirmed_at: None,
        });
        layer.changed();
        tracing::trace!(resource = %self.key, step = id.0, "Applied optimistic update");
        Some(id)
    }

    /// Remove one step; the others stay applied.
    pub fn rollback(&self, id: StepId) {
        let mut layer = self.lock();
        let before = layer.steps.len();
        layer.steps.retain(|step| step.id != id);
        if layer.steps.len() != before {
            layer.changed();
            tracing::trace!(resource = %self.key, step = id.0, "Rolled back optimistic update");
        }
    }

    /// Keep a step until the next authoritative value replaces the cached
    /// one.
    pub fn confirm(&self, id: StepId) {
        let version = self.cache.data_version(&self.key);
        let mut layer = self.lock();
        if let Some(step) = layer.steps.iter_mut().find(|step| step.id == id) {
            step.confirmed_at = Some(version);
        }
    }

    pub fn clear(&self) {
        let mut layer = self.lock();
        layer.steps.clear();
        layer.changed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FetchOptions;
    use crate::loader::ResourceLoader;
    use aula_core::FetchError;

    async fn seeded(cache: &ResourceCache, key: &CacheKey, rows: Vec<u32>) {
        let loader: Arc<dyn ResourceLoader<Vec<u32>>> = Arc::new(move || {
            let rows = rows.clone();
            async move { Ok::<_, FetchError>(rows) }
        });
        cache
            .fetch_with(key, loader, FetchOptions::forced())
            .await
            .unwrap();
    }

    fn without(id: u32) -> impl Fn(&Vec<u32>) -> Vec<u32> + Send + Sync {
        move |rows| rows.iter().copied().filter(|r| *r != id).collect()
    }

    #[tokio::test]
    async fn test_apply_and_rollback() {
        let cache = ResourceCache::with_defaults();
        let key = CacheKey::new("aulas");
        seeded(&cache, &key, vec![1, 2, 3]).await;

        let overlay = Overlay::<Vec<u32>>::new(&cache, key.clone());
        let step = overlay.apply(without(2)).unwrap();
        assert_eq!(*overlay.current().unwrap(), vec![1, 3]);
        // cached data untouched
        assert_eq!(*cache.get::<Vec<u32>>(&key).data.unwrap(), vec![1, 2, 3]);

        overlay.rollback(step);
        assert!(overlay.current().is_none());
    }

    #[tokio::test]
    async fn test_apply_without_data_is_noop() {
        let cache = ResourceCache::with_defaults();
        let overlay = Overlay::<Vec<u32>>::new(&cache, CacheKey::new("aulas"));
        assert!(overlay.apply(|rows: &Vec<u32>| rows.clone()).is_none());
        assert!(!overlay.is_active());
    }

    #[tokio::test]
    async fn test_fresh_data_discards_confirmed_steps_only() {
        let cache = ResourceCache::with_defaults();
        let key = CacheKey::new("aulas");
        seeded(&cache, &key, vec![1, 2, 3]).await;

        let overlay = Overlay::<Vec<u32>>::new(&cache, key.clone());
        let confirmed = overlay.apply(without(1)).unwrap();
        overlay.apply(without(3)).unwrap();
        overlay.confirm(confirmed);
        assert_eq!(*overlay.current().unwrap(), vec![2]);

        // The server already dropped 1; 3 is still pending.
        seeded(&cache, &key, vec![2, 3, 4]).await;
        assert_eq!(overlay.step_count(), 1);
        assert_eq!(*overlay.current().unwrap(), vec![2, 4]);
    }

    #[tokio::test]
    async fn test_rollbacks_in_any_order_leave_other_steps() {
        let cache = ResourceCache::with_defaults();
        let key = CacheKey::new("aulas");
        seeded(&cache, &key, vec![1, 2, 3]).await;

        let overlay = Overlay::<Vec<u32>>::new(&cache, key);
        let first = overlay.apply(without(2)).unwrap();
        let second = overlay.apply(without(3)).unwrap();
        assert_eq!(*overlay.current().unwrap(), vec![1]);

        overlay.rollback(first);
        assert_eq!(*overlay.current().unwrap(), vec![1, 2]);
        overlay.rollback(second);
        assert!(overlay.current().is_none());
    }
}
