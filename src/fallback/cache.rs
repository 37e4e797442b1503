//! TTL cache of recent successful completions.

use crate::api::types::ChatRequest;
use dashmap::DashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    text: String,
    created: Instant,
}

/// Request-fingerprint keyed response cache with lazy TTL eviction.
///
/// Entries are only written on successful live completions and only read on
/// the cache fallback tier, so a stale-but-present answer is always preferred
/// over a canned one.
pub struct ResponseCache {
    entries: DashMap<u64, CacheEntry>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Stable fingerprint over the request's semantic content.
    ///
    /// Message content is lowercased and whitespace-collapsed so trivially
    /// reworded whitespace doesn't miss the cache; roles and generation
    /// parameters stay significant. DefaultHasher with the default key is
    /// deterministic within one process lifetime, which is all the cache
    /// needs.
    pub fn fingerprint(request: &ChatRequest) -> u64 {
        let mut hasher = DefaultHasher::new();
        for message in &request.messages {
            message.role.hash(&mut hasher);
            for word in message.content.split_whitespace() {
                word.to_lowercase().hash(&mut hasher);
            }
        }
        request.max_tokens.hash(&mut hasher);
        request.temperature.map(f32::to_bits).hash(&mut hasher);
        hasher.finish()
    }

    /// Look up a cached response; expired entries are evicted on read.
    pub fn get(&self, fingerprint: u64) -> Option<String> {
        let expired = match self.entries.get(&fingerprint) {
            Some(entry) if entry.created.elapsed() < self.ttl => {
                return Some(entry.text.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(&fingerprint);
        }
        None
    }

    /// Store a successful response, refreshing the entry's TTL.
    pub fn put(&self, fingerprint: u64, text: String) {
        self.entries.insert(
            fingerprint,
            CacheEntry {
                text,
                created: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
