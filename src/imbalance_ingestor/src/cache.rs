//! Time-to-live result cache with single-flight coalescing.
//!
//! Readers call [`TtlCache::get`], which is one atomic snapshot load plus a
//! `HashMap` lookup; no lock is taken. Writers call [`TtlCache::insert`], which
//! atomically swaps in a copy of the map with the new entry and without any
//! expired ones. Entries expire by time only, measured with the injected
//! [`Clock`].
//!
//! [`TtlCache::lock_key`] hands out a per-key async lock. A caller that misses
//! the cache takes the lock, re-checks, and only then does the expensive work,
//! so a second caller for the same key waits for the first instead of
//! repeating it.

use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Arc, Mutex, PoisonError, Weak},
};

use arc_swap::ArcSwap;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::clock::Clock;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

type Snapshot<K, V> = HashMap<K, CacheEntry<V>>;

pub struct TtlCache<K, V> {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: ArcSwap<Snapshot<K, V>>,
    gates: Mutex<HashMap<K, Weak<AsyncMutex<()>>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            entries: ArcSwap::from_pointee(Snapshot::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a clone of the live value for `key`, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        self.entries
            .load()
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }

    /// Stores `value` until `now + ttl`, replacing any previous entry and
    /// dropping expired ones. An expiry past the representable range never
    /// expires.
    pub fn insert(&self, key: K, value: V) {
        let now = self.clock.now();
        let entry = CacheEntry {
            value,
            expires_at: now
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        self.entries.rcu(|current| {
            let mut next: Snapshot<K, V> = current
                .iter()
                .filter(|(_, e)| e.expires_at > now)
                .map(|(k, e)| (k.clone(), e.clone()))
                .collect();
            next.insert(key.clone(), entry.clone());
            next
        });
    }

    /// Number of entries that have not expired yet.
    pub fn live_entries(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .load()
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub fn clear(&self) {
        self.entries.store(Arc::new(Snapshot::new()));
    }

    /// Acquires the single-flight lock for `key`.
    ///
    /// Locks for keys nobody holds are pruned on the next call.
    pub async fn lock_key(&self, key: &K) -> OwnedMutexGuard<()> {
        let gate = {
            let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
            gates.retain(|_, weak| weak.strong_count() > 0);
            match gates.get(key).and_then(Weak::upgrade) {
                Some(gate) => gate,
                None => {
                    let gate = Arc::new(AsyncMutex::new(()));
                    gates.insert(key.clone(), Arc::downgrade(&gate));
                    gate
                }
            }
        };
        gate.lock_owned().await
    }
}
