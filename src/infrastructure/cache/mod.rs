//! Bounded in-memory content cache
//!
//! Maps a content fingerprint to previously fetched raw text so repeat
//! requests within the TTL skip the GitHub round trip. Single-process,
//! short-lived by design: entries expire by TTL and the map is bounded by
//! entry count with oldest-first eviction. One lock guards insert/evict;
//! contention is low enough that nothing finer is warranted.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    inserted_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Insertion order for oldest-first eviction
    order: Vec<String>,
}

/// TTL + capacity bounded cache for fetched content
#[derive(Debug)]
pub struct ContentCache {
    inner: RwLock<CacheInner>,
    max_entries: usize,
    ttl: Duration,
}

impl ContentCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                entries: HashMap::new(),
                order: Vec::new(),
            }),
            max_entries: max_entries.max(1),
            ttl,
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a live entry. Expired entries are removed on the way.
    pub async fn get(&self, key: &str) -> Option<String> {
        {
            let inner = self.inner.read().await;
            match inner.entries.get(key) {
                Some(entry) if entry.inserted_at.elapsed() <= self.ttl => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: upgrade to a write lock and purge.
        let mut inner = self.inner.write().await;
        if let Some(entry) = inner.entries.get(key) {
            if entry.inserted_at.elapsed() > self.ttl {
                inner.entries.remove(key);
                inner.order.retain(|k| k != key);
            } else {
                return Some(entry.value.clone());
            }
        }
        None
    }

    /// Insert (or refresh) an entry, then evict expired and over-capacity
    /// entries, oldest first.
    pub async fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let mut inner = self.inner.write().await;

        if inner.entries.contains_key(&key) {
            inner.order.retain(|k| k != &key);
        }
        inner.order.push(key.clone());
        inner.entries.insert(
            key,
            CacheEntry {
                value: value.into(),
                inserted_at: Instant::now(),
            },
        );

        self.evict(&mut inner);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn evict(&self, inner: &mut CacheInner) {
        let ttl = self.ttl;
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, e)| e.inserted_at.elapsed() > ttl)
            .map(|(k, _)| k.clone())
            .collect();
        for key in expired {
            inner.entries.remove(&key);
            inner.order.retain(|k| k != &key);
        }

        while inner.entries.len() > self.max_entries {
            let oldest = inner.order.remove(0);
            inner.entries.remove(&oldest);
        }
    }
}
