use super::cache_key::CacheKey;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

struct CacheEntry<V> {
    value: Arc<V>,
    inserted_at: Instant,
    sequence: u64,
}

struct CacheInner<V> {
    entries: HashMap<CacheKey, CacheEntry<V>>,
    // Insertion order. Stale slots (replaced or expired keys) are skipped by sequence.
    order: VecDeque<(CacheKey, u64)>,
    next_sequence: u64,
    closed: bool,
}

/// Bounded key to result store with TTL and insertion-order eviction
pub struct CacheStore<V> {
    inner: Mutex<CacheInner<V>>,
    max_entries: usize,
    ttl: Duration,
}

impl<V> CacheStore<V> {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
                next_sequence: 0,
                closed: false,
            }),
            max_entries,
            ttl,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<V>> {
        let mut inner = self.inner.lock();
        let expired = match inner.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() <= self.ttl => {
                return Some(Arc::clone(&entry.value));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            debug!("Cache entry {} expired", key);
            inner.entries.remove(key);
        }
        None
    }

    /// Inserts or replaces `key`. A replaced key moves to the back of the eviction queue.
    pub fn put(&self, key: CacheKey, value: V) {
        if self.max_entries == 0 {
            return;
        }

        let mut inner = self.inner.lock();
        if inner.closed {
            debug!("Cache closed, dropping entry {}", key);
            return;
        }
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner.order.push_back((key.clone(), sequence));
        inner.entries.insert(
            key,
            CacheEntry {
                value: Arc::new(value),
                inserted_at: Instant::now(),
                sequence,
            },
        );

        while inner.entries.len() > self.max_entries {
            let Some((oldest, oldest_sequence)) = inner.order.pop_front() else {
                break;
            };
            let live = inner
                .entries
                .get(&oldest)
                .is_some_and(|entry| entry.sequence == oldest_sequence);
            if live {
                debug!("Evicting cache entry {}", oldest);
                inner.entries.remove(&oldest);
            }
        }

        if inner.order.len() > self.max_entries.saturating_mul(2) {
            Self::compact(&mut inner);
        }
    }

    /// Drops every entry older than the TTL, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        let mut removed = 0;
        while let Some((key, sequence)) = inner.order.front().cloned() {
            let state = inner
                .entries
                .get(&key)
                .filter(|entry| entry.sequence == sequence)
                .map(|entry| entry.inserted_at.elapsed() > self.ttl);
            match state {
                // Queue is in insertion order, so the first fresh entry ends the sweep
                Some(false) => break,
                Some(true) => {
                    inner.entries.remove(&key);
                    removed += 1;
                }
                None => {}
            }
            inner.order.pop_front();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.get(key).is_some()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    /// Clears the store and refuses every later `put`.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.entries.clear();
        inner.order.clear();
    }

    fn compact(inner: &mut CacheInner<V>) {
        let CacheInner { entries, order, .. } = inner;
        order.retain(|(key, sequence)| {
            entries
                .get(key)
                .is_some_and(|entry| entry.sequence == *sequence)
        });
    }
}
