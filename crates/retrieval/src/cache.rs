//! Retrieval Cache (§4.12): LRU with TTL, keyed on
//! `(normalized query, corpus_version)`. Any Document Store mutation bumps
//! `CorpusVersion`, which is folded into the key so stale entries are never
//! served — they simply become unreachable and age out under the LRU cap.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use docqa_core::{CorpusVersion, RetrievalResult};
use lru::LruCache;
use parking_lot::Mutex;

const DEFAULT_CAPACITY: usize = 100;
const DEFAULT_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f32 / total as f32
        }
    }
}

struct Entry {
    results: Vec<RetrievalResult>,
    inserted_at: Instant,
}

struct State {
    cache: LruCache<(String, CorpusVersion), Entry>,
    hits: u64,
    misses: u64,
}

/// Thread-safe under concurrent reads and writes (single mutex guarding a
/// stdlib-free LRU, matching the size the cache is meant to stay at — 100
/// entries never justifies a lock-free structure).
pub struct RetrievalCache {
    state: Mutex<State>,
    ttl: Duration,
}

impl RetrievalCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            state: Mutex::new(State { cache: LruCache::new(capacity), hits: 0, misses: 0 }),
            ttl,
        }
    }

    fn key(query: &str, version: CorpusVersion) -> (String, CorpusVersion) {
        (query.trim().to_lowercase(), version)
    }

    pub fn get(&self, query: &str, version: CorpusVersion) -> Option<Vec<RetrievalResult>> {
        let key = Self::key(query, version);
        let mut state = self.state.lock();
        let ttl = self.ttl;
        let expired = state.cache.peek(&key).is_some_and(|e| e.inserted_at.elapsed() > ttl);
        if expired {
            state.cache.pop(&key);
        }
        match state.cache.get(&key) {
            Some(entry) => {
                let results = entry.results.clone();
                state.hits += 1;
                Some(results)
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    pub fn put(&self, query: &str, version: CorpusVersion, results: Vec<RetrievalResult>) {
        let key = Self::key(query, version);
        self.state.lock().cache.put(key, Entry { results, inserted_at: Instant::now() });
    }

    pub fn clear(&self) {
        self.state.lock().cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats { hits: state.hits, misses: state.misses, size: state.cache.len() }
    }
}

impl Default for RetrievalCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}
