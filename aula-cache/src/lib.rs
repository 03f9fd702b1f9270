//! Aula Cache - Resource Cache and Bindings
//!
//! Keyed, read-through cache of server resources shared by every view of
//! the client, plus the two bindings views use to talk to it:
//!
//! - [`Query`]: subscribe to a key, load it when missing or stale, render
//!   its [`QueryState`].
//! - [`Mutation`]: run a write, then remove and invalidate the keys it
//!   affects and notify the user; optionally apply an optimistic
//!   [`Overlay`] first and roll it back on failure.
//!
//! Concurrent reads of one key share a single load, stale data is served
//! while it is revalidated in the background, and entries nobody observes
//! are evicted after their expiry window.

pub mod cache;
pub mod config;
pub mod entry;
pub mod freshness;
pub mod gate;
pub mod key;
pub mod loader;
pub mod mutation;
pub mod overlay;
pub mod query;
pub mod retry;
pub mod stats;
pub mod subscription;

pub use cache::{FetchOptions, ResourceCache};
pub use config::{CacheConfig, ResponseOrdering};
pub use entry::{CacheEntry, CacheEvent, EntryStatus};
pub use freshness::Freshness;
pub use gate::{GatePermit, InFlightGate};
pub use key::{CacheKey, KeyPart};
pub use loader::{load_with_retry, Operation, ResourceLoader};
pub use mutation::{
    ExecutionStatus, Mutation, MutationBuilder, MutationExecution, MutationHandle,
    MutationMessages, Notifier,
};
pub use overlay::{Overlay, StepId};
pub use query::{Query, QueryOptions, QueryState};
pub use retry::{RetryDecision, RetryPolicy, RetryState};
pub use stats::CacheStats;
pub use subscription::Subscription;
