//! Per-key guard against duplicate in-flight writes.
//!
//! The delete button of a row is disabled while a delete for that row is
//! running; the gate is what the view consults.

use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use aula_core::MutationError;

/// Set of keys with a write in flight.
pub struct InFlightGate<K> {
    keys: Arc<Mutex<HashSet<K>>>,
}

impl<K> Clone for InFlightGate<K> {
    fn clone(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
        }
    }
}

impl<K> Default for InFlightGate<K> {
    fn default() -> Self {
        Self {
            keys: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

fn lock<K>(keys: &Mutex<HashSet<K>>) -> MutexGuard<'_, HashSet<K>> {
    keys.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<K> InFlightGate<K>
where
    K: Eq + Hash + Clone + Display,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`. Fails with [`MutationError::AlreadyInFlight`] if it is
    /// already claimed; the claim is released when the permit drops.
    pub fn try_acquire(&self, key: K) -> Result<GatePermit<K>, MutationError> {
        let mut keys = lock(&self.keys);
        if !keys.insert(key.clone()) {
            return Err(MutationError::AlreadyInFlight {
                key: key.to_string(),
            });
        }
        Ok(GatePermit {
            keys: Arc::clone(&self.keys),
            key,
        })
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        lock(&self.keys).contains(key)
    }

    pub fn len(&self) -> usize {
        lock(&self.keys).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Claim on one key of an [`InFlightGate`].
pub struct GatePermit<K: Eq + Hash> {
    keys: Arc<Mutex<HashSet<K>>>,
    key: K,
}

impl<K: Eq + Hash> GatePermit<K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K: Eq + Hash + std::fmt::Debug> std::fmt::Debug for GatePermit<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatePermit").field("key", &self.key).finish()
    }
}

impl<K: Eq + Hash> Drop for GatePermit<K> {
    fn drop(&mut self) {
        lock(&self.keys).remove(&self.key);
    }
}
