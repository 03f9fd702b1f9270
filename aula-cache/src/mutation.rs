//! Mutation binding.
//!
//! Wraps a write operation with its cache side effects: optional
//! optimistic overlays applied before the call and rolled back on failure,
//! removal of the written resource's own key, invalidation of the keys the
//! write makes stale, and a user-visible notification either way.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use aula_core::{FetchError, MutationError, Timestamp};
use chrono::Utc;
use tokio::task::JoinHandle;

use crate::cache::ResourceCache;
use crate::key::CacheKey;
use crate::loader::Operation;
use crate::overlay::Overlay;

/// Sink for user-visible success and error messages.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str, description: Option<&str>);
    fn error(&self, message: &str, description: Option<&str>);
}

/// Messages shown when a mutation settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationMessages {
    pub success: String,
    pub error: String,
}

impl MutationMessages {
    pub fn new(success: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: success.into(),
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Pending,
    Succeeded,
    Failed,
}

/// Record of one `mutate` call.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationExecution {
    pub id: u64,
    pub status: ExecutionStatus,
    pub started_at: Timestamp,
    pub finished_at: Option<Timestamp>,
    pub error: Option<FetchError>,
}

/// Settles one applied optimistic step: `true` keeps it until fresh data
/// replaces it, `false` rolls it back.
type Settle = Box<dyn FnOnce(bool) + Send>;
type OptimisticStep<I> = Arc<dyn Fn(&I) -> Option<Settle> + Send + Sync>;
type RemoveKeyFn<I> = Arc<dyn Fn(&I) -> Option<CacheKey> + Send + Sync>;

/// The optimistic steps one execution applied. Rolled back on drop unless
/// confirmed, so a cancelled mutation does not leave its value behind.
struct AppliedSteps(Vec<Settle>);

impl AppliedSteps {
    fn confirm(mut self) {
        for settle in self.0.drain(..) {
            settle(true);
        }
    }
}

impl Drop for AppliedSteps {
    fn drop(&mut self) {
        while let Some(settle) = self.0.pop() {
            settle(false);
        }
    }
}

struct PendingGuard(Arc<AtomicUsize>);

impl PendingGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Builder for [`Mutation`].
pub struct MutationBuilder<I, R> {
    cache: ResourceCache,
    operation: Arc<dyn Operation<I, R>>,
    invalidates: Vec<CacheKey>,
    removes: Option<RemoveKeyFn<I>>,
    optimistic: Vec<OptimisticStep<I>>,
    notifier: Option<Arc<dyn Notifier>>,
    messages: Option<MutationMessages>,
}

impl<I, R> MutationBuilder<I, R>
where
    I: Send + 'static,
    R: Send + 'static,
{
    /// Invalidate `pattern` after every successful run.
    pub fn invalidates(mut self, pattern: CacheKey) -> Self {
        self.invalidates.push(pattern);
        self
    }

    /// Remove the key derived from the input after a successful run.
    pub fn removes<F>(mut self, key_for: F) -> Self
    where
        F: Fn(&I) -> Option<CacheKey> + Send + Sync + 'static,
    {
        self.removes = Some(Arc::new(key_for));
        self
    }

    /// Add `update` to `overlay` before the operation runs. Only this
    /// execution's step is rolled back if the operation fails; on success it
    /// stays until the next authoritative value lands.
    pub fn optimistic<T, F>(mut self, overlay: Overlay<T>, update: F) -> Self
    where
        I: Clone + Sync,
        T: Send + Sync + 'static,
        F: Fn(&T, &I) -> T + Send + Sync + 'static,
    {
        let update = Arc::new(update);
        self.optimistic.push(Arc::new(move |input: &I| {
            let input = input.clone();
            let update = Arc::clone(&update);
            let step = overlay.apply(move |current| update(current, &input))?;
            let overlay = overlay.clone();
            Some(Box::new(move |keep: bool| {
                if keep {
                    overlay.confirm(step);
                } else {
                    overlay.rollback(step);
                }
            }) as Settle)
        }));
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn messages(mut self, success: impl Into<String>, error: impl Into<String>) -> Self {
        self.messages = Some(MutationMessages::new(success, error));
        self
    }

    pub fn build(self) -> Mutation<I, R> {
        Mutation {
            cache: self.cache,
            operation: self.operation,
            invalidates: Arc::new(self.invalidates),
            removes: self.removes,
            optimistic: Arc::new(self.optimistic),
            notifier: self.notifier,
            messages: self.messages,
            pending: Arc::new(AtomicUsize::new(0)),
            next_id: Arc::new(AtomicU64::new(1)),
            last: Arc::new(Mutex::new(None)),
        }
    }
}

/// A write operation bound to the cache. Clones share pending state.
pub struct Mutation<I, R> {
    cache: ResourceCache,
    operation: Arc<dyn Operation<I, R>>,
    invalidates: Arc<Vec<CacheKey>>,
    removes: Option<RemoveKeyFn<I>>,
    optimistic: Arc<Vec<OptimisticStep<I>>>,
    notifier: Option<Arc<dyn Notifier>>,
    messages: Option<MutationMessages>,
    pending: Arc<AtomicUsize>,
    next_id: Arc<AtomicU64>,
    last: Arc<Mutex<Option<MutationExecution>>>,
}

impl<I, R> Clone for Mutation<I, R> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            operation: Arc::clone(&self.operation),
            invalidates: Arc::clone(&self.invalidates),
            removes: self.removes.clone(),
            optimistic: Arc::clone(&self.optimistic),
            notifier: self.notifier.clone(),
            messages: self.messages.clone(),
            pending: Arc::clone(&self.pending),
            next_id: Arc::clone(&self.next_id),
            last: Arc::clone(&self.last),
        }
    }
}

impl<I, R> Mutation<I, R>
where
    I: Send + 'static,
    R: Send + 'static,
{
    pub fn builder<O>(cache: &ResourceCache, operation: O) -> MutationBuilder<I, R>
    where
        O: Operation<I, R> + 'static,
    {
        MutationBuilder {
            cache: cache.clone(),
            operation: Arc::new(operation),
            invalidates: Vec::new(),
            removes: None,
            optimistic: Vec::new(),
            notifier: None,
            messages: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending_count() > 0
    }

    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn last_execution(&self) -> Option<MutationExecution> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, execution: MutationExecution) {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        // A slower, older call must not overwrite a newer call's record.
        if last.as_ref().map_or(true, |prev| prev.id <= execution.id) {
            *last = Some(execution);
        }
    }

    /// Run the operation and apply its cache side effects.
    ///
    /// On success the derived key is removed, then every configured pattern
    /// is invalidated (refetching those still observed), then the success
    /// message is shown. On failure optimistic updates are rolled back and
    /// the error message is shown with the server's message as description.
    pub async fn mutate(&self, input: I) -> Result<R, MutationError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.run(id, input).await
    }

    async fn run(&self, id: u64, input: I) -> Result<R, MutationError> {
        let _pending = PendingGuard::enter(&self.pending);
        let started_at = Utc::now();
        self.record(MutationExecution {
            id,
            status: ExecutionStatus::Pending,
            started_at,
            finished_at: None,
            error: None,
        });

        let remove_key = self.removes.as_ref().and_then(|key_for| key_for(&input));
        let applied = AppliedSteps(
            self.optimistic
                .iter()
                .filter_map(|step| step(&input))
                .collect(),
        );

        match self.operation.run(input).await {
            Ok(result) => {
                applied.confirm();
                if let Some(key) = remove_key {
                    self.cache.remove(&key);
                }
                for pattern in self.invalidates.iter() {
                    self.cache.invalidate(pattern);
                }
                if let (Some(notifier), Some(messages)) = (&self.notifier, &self.messages) {
                    notifier.success(&messages.success, None);
                }
                tracing::debug!(mutation = id, "Mutation succeeded");
                self.record(MutationExecution {
                    id,
                    status: ExecutionStatus::Succeeded,
                    started_at,
                    finished_at: Some(Utc::now()),
                    error: None,
                });
                Ok(result)
            }
            Err(err) => {
                drop(applied);
                if let (Some(notifier), Some(messages)) = (&self.notifier, &self.messages) {
                    notifier.error(&messages.error, Some(err.message()));
                }
                tracing::warn!(mutation = id, error = %err, "Mutation failed");
                self.record(MutationExecution {
                    id,
                    status: ExecutionStatus::Failed,
                    started_at,
                    finished_at: Some(Utc::now()),
                    error: Some(err.clone()),
                });
                Err(MutationError::Failed(err))
            }
        }
    }

    /// Run [`mutate`](Self::mutate) on the runtime without waiting for it.
    pub fn mutate_detached(&self, input: I) -> MutationHandle<R> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mutation = self.clone();
        let join = tokio::spawn(async move { mutation.run(id, input).await });
        MutationHandle { id, join }
    }
}

/// Handle on a detached mutation.
pub struct MutationHandle<R> {
    id: u64,
    join: JoinHandle<Result<R, MutationError>>,
}

impl<R> MutationHandle<R> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub async fn wait(self) -> Result<R, MutationError> {
        match self.join.await {
            Ok(result) => result,
            Err(err) => Err(MutationError::Aborted {
                reason: err.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FetchOptions;
    use crate::loader::ResourceLoader;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorded {
        messages: Mutex<Vec<(bool, String, Option<String>)>>,
    }

    impl Notifier for Recorded {
        fn success(&self, message: &str, description: Option<&str>) {
            self.messages.lock().unwrap().push((
                true,
                message.to_string(),
                description.map(str::to_string),
            ));
        }

        fn error(&self, message: &str, description: Option<&str>) {
            self.messages.lock().unwrap().push((
                false,
                message.to_string(),
                description.map(str::to_string),
            ));
        }
    }

    fn list_loader(rows: Arc<Mutex<Vec<i64>>>) -> Arc<dyn ResourceLoader<Vec<i64>>> {
        Arc::new(move || {
            let rows = Arc::clone(&rows);
            async move { Ok::<_, FetchError>(rows.lock().unwrap().clone()) }
        })
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_invalidates_and_notifies() {
        let cache = ResourceCache::with_defaults();
        let list = CacheKey::new("aulas");
        let server = Arc::new(Mutex::new(vec![1, 2]));
        let _sub = cache.subscribe(&list);
        cache
            .fetch_with(&list, list_loader(Arc::clone(&server)), FetchOptions::default())
            .await
            .unwrap();

        let notifier = Arc::new(Recorded::default());
        let backend = Arc::clone(&server);
        let create = Mutation::builder(&cache, move |id: i64| {
            let backend = Arc::clone(&backend);
            async move {
                backend.lock().unwrap().push(id);
                Ok::<_, FetchError>(id)
            }
        })
        .invalidates(list.clone())
        .notifier(notifier.clone())
        .messages("Aula creada", "Error al crear aula")
        .build();

        assert_eq!(create.mutate(3).await, Ok(3));
        settle().await;

        assert_eq!(*cache.get::<Vec<i64>>(&list).data.unwrap(), vec![1, 2, 3]);
        assert_eq!(
            *notifier.messages.lock().unwrap(),
            vec![(true, "Aula creada".to_string(), None)]
        );
        let last = create.last_execution().unwrap();
        assert_eq!(last.status, ExecutionStatus::Succeeded);
        assert!(last.finished_at.is_some());
        assert!(!create.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_rolls_back_and_reports_server_message() {
        let cache = ResourceCache::with_defaults();
        let list = CacheKey::new("aulas");
        let server = Arc::new(Mutex::new(vec![1, 2, 3]));
        cache
            .fetch_with(&list, list_loader(server), FetchOptions::default())
            .await
            .unwrap();

        let overlay = Overlay::<Vec<i64>>::new(&cache, list.clone());
        let notifier = Arc::new(Recorded::default());
        let delete = Mutation::builder(&cache, |_id: i64| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Err::<(), _>(FetchError::status(409, "El aula tiene estudiantes"))
        })
        .optimistic(overlay.clone(), |rows: &Vec<i64>, id: &i64| {
            rows.iter().copied().filter(|r| r != id).collect()
        })
        .invalidates(list.clone())
        .notifier(notifier.clone())
        .messages("Aula eliminada", "Error al eliminar aula")
        .build();

        let running = delete.mutate_detached(2);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(*overlay.current().unwrap(), vec![1, 3]);
        assert!(delete.is_pending());

        let err = running.wait().await.unwrap_err();
        assert_eq!(err.fetch_error().and_then(|e| e.status_code()), Some(409));
        assert!(overlay.current().is_none());
        assert_eq!(*cache.get::<Vec<i64>>(&list).data.unwrap(), vec![1, 2, 3]);
        assert_eq!(
            *notifier.messages.lock().unwrap(),
            vec![(
                false,
                "Error al eliminar aula".to_string(),
                Some("El aula tiene estudiantes".to_string())
            )]
        );
        assert_eq!(
            delete.last_execution().unwrap().status,
            ExecutionStatus::Failed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_failures_restore_every_row() {
        let cache = ResourceCache::with_defaults();
        let list = CacheKey::new("aulas");
        cache
            .fetch_with(
                &list,
                list_loader(Arc::new(Mutex::new(vec![1, 2, 3]))),
                FetchOptions::default(),
            )
            .await
            .unwrap();

        let overlay = Overlay::<Vec<i64>>::new(&cache, list.clone());
        let delete = Mutation::builder(&cache, |id: i64| async move {
            // 2 fails first, 3 later.
            tokio::time::sleep(Duration::from_millis(10 * id as u64)).await;
            Err::<(), _>(FetchError::status(409, "El aula tiene estudiantes"))
        })
        .optimistic(overlay.clone(), |rows: &Vec<i64>, id: &i64| {
            rows.iter().copied().filter(|r| r != id).collect()
        })
        .build();

        let first = delete.mutate_detached(2);
        let second = delete.mutate_detached(3);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(*overlay.current().unwrap(), vec![1]);

        first.wait().await.unwrap_err();
        assert_eq!(*overlay.current().unwrap(), vec![1, 2]);

        second.wait().await.unwrap_err();
        assert!(overlay.current().is_none());
        assert_eq!(*cache.get::<Vec<i64>>(&list).data.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_keeps_step_until_refetch_lands() {
        let cache = ResourceCache::with_defaults();
        let list = CacheKey::new("aulas");
        let server = Arc::new(Mutex::new(vec![1, 2, 3]));
        let _sub = cache.subscribe(&list);
        cache
            .fetch_with(&list, list_loader(Arc::clone(&server)), FetchOptions::default())
            .await
            .unwrap();

        let overlay = Overlay::<Vec<i64>>::new(&cache, list.clone());
        let backend = Arc::clone(&server);
        let delete = Mutation::builder(&cache, move |id: i64| {
            let backend = Arc::clone(&backend);
            async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                backend.lock().unwrap().retain(|r| *r != id);
                Ok::<_, FetchError>(())
            }
        })
        .optimistic(overlay.clone(), |rows: &Vec<i64>, id: &i64| {
            rows.iter().copied().filter(|r| r != id).collect()
        })
        .invalidates(list.clone())
        .build();

        let running = delete.mutate_detached(2);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(*overlay.current().unwrap(), vec![1, 3]);

        running.wait().await.unwrap();
        // Row 2 never reappears, whether or not the refetch has landed yet.
        let visible = overlay
            .current()
            .or_else(|| cache.get::<Vec<i64>>(&list).data)
            .unwrap();
        assert_eq!(*visible, vec![1, 3]);

        settle().await;
        assert!(overlay.current().is_none());
        assert_eq!(*cache.get::<Vec<i64>>(&list).data.unwrap(), vec![1, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_removes_detail_key() {
        let cache = ResourceCache::with_defaults();
        let detail = CacheKey::new("aula").with(7i64);
        let loader: Arc<dyn ResourceLoader<String>> =
            Arc::new(|| async { Ok::<_, FetchError>("3ro A".to_string()) });
        cache
            .fetch_with(&detail, loader, FetchOptions::default())
            .await
            .unwrap();

        let delete = Mutation::builder(&cache, |_id: i64| async { Ok::<_, FetchError>(()) })
            .removes(|id: &i64| Some(CacheKey::new("aula").with(*id)))
            .build();
        delete.mutate(7).await.unwrap();
        assert!(!cache.contains(&detail));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_mutation_rolls_back() {
        let cache = ResourceCache::with_defaults();
        let list = CacheKey::new("aulas");
        cache
            .fetch_with(
                &list,
                list_loader(Arc::new(Mutex::new(vec![1, 2]))),
                FetchOptions::default(),
            )
            .await
            .unwrap();

        let overlay = Overlay::<Vec<i64>>::new(&cache, list);
        let slow = Mutation::builder(&cache, |_id: i64| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, FetchError>(())
        })
        .optimistic(overlay.clone(), |rows: &Vec<i64>, _: &i64| rows[..1].to_vec())
        .build();

        let outcome = tokio::time::timeout(Duration::from_millis(10), slow.mutate(2)).await;
        assert!(outcome.is_err());
        assert!(overlay.current().is_none());
        assert_eq!(slow.pending_count(), 0);
    }
}
