//! An in-memory, TTL-bounded, LRU-evicted cache of normalized responses.
//!
//! Stores the *pre-redaction* value so different callers (or the same
//! caller with different [`crate::config::QueryOptions`]) can apply
//! their own redaction policy to the same cached entry. Redaction always
//! happens on read, never on write.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

#[derive(Clone)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
    last_used: u64,
}

/// A bounded, async-safe cache keyed by query fingerprint.
///
/// Single lock, no I/O performed while held — matches the teacher's
/// `MemoryBootstrapStore` pattern of guarding a plain in-memory map with
/// one `RwLock`, generalized from per-registry-table storage to an
/// arbitrary key/value cache with capacity eviction.
pub struct Cache<K, V> {
    inner: Arc<RwLock<CacheInner<K, V>>>,
    capacity: usize,
    ttl: Duration,
}

struct CacheInner<K, V> {
    entries: HashMap<K, Entry<V>>,
    clock: u64,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                entries: HashMap::new(),
                clock: 0,
            })),
            capacity,
            ttl,
        }
    }

    /// Returns the cached value if present and not expired. A hit bumps
    /// the entry's recency for LRU purposes.
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.write().await;
        inner.clock += 1;
        let clock = inner.clock;
        let ttl = self.ttl;
        let entry = inner.entries.get_mut(key)?;
        if entry.inserted_at.elapsed() >= ttl {
            inner.entries.remove(key);
            return None;
        }
        entry.last_used = clock;
        Some(entry.value.clone())
    }

    pub async fn put(&self, key: K, value: V) {
        let mut inner = self.inner.write().await;
        inner.clock += 1;
        let clock = inner.clock;
        if inner.entries.len() >= self.capacity && !inner.entries.contains_key(&key) {
            if let Some(lru_key) = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(k, _)| k.clone())
            {
                inner.entries.remove(&lru_key);
            }
        }
        inner.entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
                last_used: clock,
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            capacity: self.capacity,
            ttl: self.ttl,
        }
    }
}
