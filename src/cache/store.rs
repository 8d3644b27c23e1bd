//! Bounded, time-boxed response store.

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::config::CacheConfig;
use crate::http::response::ProxyResponse;

/// A stored backend response.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub cached_at: Instant,
}

impl CacheEntry {
    pub fn age(&self) -> Duration {
        self.cached_at.elapsed()
    }

    pub fn to_response(&self) -> ProxyResponse {
        ProxyResponse::new(self.status, self.headers.clone(), self.body.clone())
    }
}

/// Response cache keyed by request path.
///
/// Expiry is checked lazily on read. When full, inserting a new key evicts
/// entries with the oldest `cached_at` until there is room. Concurrent puts
/// of new keys can briefly overshoot `max_size`; the next new-key put trims
/// the map back to the cap.
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    max_size: usize,
    entries: DashMap<String, CacheEntry>,
}

impl ResponseCache {
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            ttl,
            max_size,
            entries: DashMap::new(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl(), config.max_size)
    }

    /// Live entry for `key`. An expired entry is removed and `None` returned.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.get_at(key, Instant::now())
    }

    /// Store `response` under `key`, stamped now. Replaces any previous entry.
    pub fn put(&self, key: impl Into<String>, response: &ProxyResponse) {
        self.put_at(key.into(), response, Instant::now());
    }

    /// Remove `key` if present.
    pub fn evict(&self, key: &str) {
        if self.entries.remove(key).is_some() {
            tracing::debug!(key = %key, "Cache entry evicted");
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
        tracing::info!("Response cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.cached_at) >= self.ttl
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<CacheEntry> {
        let entry = self.entries.get(key)?.value().clone();
        if self.is_expired(&entry, now) {
            // Only drop what we saw; a concurrent put may have refreshed it.
            self.entries
                .remove_if(key, |_, current| current.cached_at == entry.cached_at);
            tracing::debug!(key = %key, "Cache entry expired");
            return None;
        }
        Some(entry)
    }

    fn put_at(&self, key: String, response: &ProxyResponse, now: Instant) {
        if self.max_size == 0 {
            return;
        }

        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.max_size {
                if !self.evict_oldest() {
                    break;
                }
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                status: response.status,
                headers: response.headers.clone(),
                body: response.body.clone(),
                cached_at: now,
            },
        );
    }

    /// Returns false once the map is empty.
    fn evict_oldest(&self) -> bool {
        // Finish the scan before removing; holding a shard read guard while
        // removing from the same shard would deadlock.
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().cached_at)
            .map(|entry| (entry.key().clone(), entry.value().cached_at));

        let Some((key, cached_at)) = oldest else {
            return false;
        };
        // A refreshed entry is kept; the caller rescans.
        if self
            .entries
            .remove_if(&key, |_, current| current.cached_at == cached_at)
            .is_some()
        {
            tracing::debug!(key = %key, "Cache full, evicted oldest entry");
        }
        true
    }
}
