//! Loader and operation seams.
//!
//! Loaders are the read side supplied by resource-specific HTTP
//! collaborators; operations are the write side. Plain async closures
//! implement both traits.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use aula_core::FetchError;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::key::CacheKey;
use crate::retry::{RetryDecision, RetryPolicy};

/// Fetches the current value of one resource.
#[async_trait]
pub trait ResourceLoader<T>: Send + Sync {
    async fn load(&self) -> Result<T, FetchError>;
}

#[async_trait]
impl<T, F, Fut> ResourceLoader<T> for F
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
{
    async fn load(&self) -> Result<T, FetchError> {
        (self)().await
    }
}

/// Side-effecting write against the backend.
#[async_trait]
pub trait Operation<I, R>: Send + Sync {
    async fn run(&self, input: I) -> Result<R, FetchError>;
}

#[async_trait]
impl<I, R, F, Fut> Operation<I, R> for F
where
    I: Send + 'static,
    R: Send + 'static,
    F: Fn(I) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, FetchError>> + Send + 'static,
{
    async fn run(&self, input: I) -> Result<R, FetchError> {
        (self)(input).await
    }
}

/// Type-erased value stored in the cache.
pub(crate) type ErasedValue = Arc<dyn Any + Send + Sync>;

/// Outcome shared by every waiter of one fetch.
pub(crate) type Outcome = Result<ErasedValue, FetchError>;

/// Loader with its value type and retry policy erased, kept on the entry so
/// invalidation can refetch without the original caller.
pub(crate) type ErasedLoader = Arc<dyn Fn() -> BoxFuture<'static, Outcome> + Send + Sync>;

pub(crate) fn erase<T>(
    key: CacheKey,
    loader: Arc<dyn ResourceLoader<T>>,
    retry: RetryPolicy,
) -> ErasedLoader
where
    T: Send + Sync + 'static,
{
    Arc::new(move || {
        let loader = Arc::clone(&loader);
        let key = key.clone();
        async move {
            let value = load_with_retry(&key, loader.as_ref(), retry).await?;
            Ok(Arc::new(value) as ErasedValue)
        }
        .boxed()
    })
}

/// Run `loader`, sleeping between transient failures per `retry`.
pub async fn load_with_retry<T>(
    key: &CacheKey,
    loader: &dyn ResourceLoader<T>,
    retry: RetryPolicy,
) -> Result<T, FetchError> {
    let mut state = retry.start();
    loop {
        match loader.load().await {
            Ok(value) => return Ok(value),
            Err(err) => match state.on_failure(&err) {
                RetryDecision::RetryAfter(delay) => {
                    tracing::debug!(
                        resource = %key,
                        attempt = state.attempt(),
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying resource load"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    tracing::warn!(
                        resource = %key,
                        attempts = state.attempt(),
                        error = %err,
                        "Resource load failed"
                    );
                    return Err(err);
                }
            },
        }
    }
}
