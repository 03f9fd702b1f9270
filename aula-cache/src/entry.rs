//! Read-only snapshots of cache entries.

use std::sync::Arc;
use std::time::Duration;

use aula_core::{FetchError, Timestamp};

use crate::key::CacheKey;

/// Lifecycle of an entry's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    /// Never fetched.
    Idle,
    /// First fetch in flight, no data yet.
    Loading,
    /// Last fetch succeeded.
    Success,
    /// Last fetch failed; previous data (if any) is still present.
    Error,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Idle => "idle",
            EntryStatus::Loading => "loading",
            EntryStatus::Success => "success",
            EntryStatus::Error => "error",
        }
    }
}

/// Snapshot of one entry at the time of the read.
///
/// The cache owns the live entry; this copy shares the data through `Arc`
/// and is never written back.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub key: CacheKey,
    pub data: Option<Arc<T>>,
    pub status: EntryStatus,
    pub error: Option<FetchError>,
    /// Wall-clock time of the last successful fetch.
    pub fetched_at: Option<Timestamp>,
    pub is_fetching: bool,
    pub is_stale: bool,
    pub stale_after: Duration,
    pub expire_after: Duration,
    /// Incremented on every successful fetch; optimistic overlays compare
    /// against it to notice authoritative data.
    pub data_version: u64,
    pub subscribers: usize,
}

impl<T> CacheEntry<T> {
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    pub fn is_success(&self) -> bool {
        self.status == EntryStatus::Success
    }
}

/// Change notification delivered to callback subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    pub key: CacheKey,
    pub status: EntryStatus,
    pub is_fetching: bool,
    pub revision: u64,
}
