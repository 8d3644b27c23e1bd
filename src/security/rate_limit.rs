//! Per-client token bucket rate limiting.
//!
//! Each client gets a bucket holding up to `requests_per_minute` tokens that
//! refills continuously at `requests_per_minute / 60` tokens per second.
//! Buckets are created full on first sight and never removed.

use dashmap::DashMap;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::config::RateLimitConfig;

/// A single client's bucket. Tokens are real-valued; only admission truncates.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
        }
    }

    fn refill(&mut self, capacity: f64, refill_rate: f64, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_refill = now;
    }

    fn try_acquire(&mut self) -> bool {
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Token bucket limiter keyed by client identifier.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,
    /// Tokens per second.
    refill_rate: f64,
    buckets: DashMap<String, TokenBucket>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            capacity: requests_per_minute,
            refill_rate: f64::from(requests_per_minute) / 60.0,
            buckets: DashMap::new(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests_per_minute)
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Admit or deny one request. Refill and spend happen under the client's map slot.
    pub fn allow_request(&self, client_id: &str) -> bool {
        self.allow_request_at(client_id, Instant::now())
    }

    /// Whole tokens left for `client_id`. Unseen clients have a full bucket.
    pub fn get_remaining(&self, client_id: &str) -> u32 {
        self.remaining_at(client_id, Instant::now())
    }

    /// Unix time (seconds) at which the client's bucket will be full again.
    pub fn get_reset_time(&self, client_id: &str) -> u64 {
        self.reset_time_at(client_id, Instant::now(), epoch_secs())
    }

    /// Number of clients with a bucket.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    fn allow_request_at(&self, client_id: &str, now: Instant) -> bool {
        let capacity = f64::from(self.capacity);
        let mut bucket = self
            .buckets
            .entry(client_id.to_string())
            .or_insert_with(|| TokenBucket::new(capacity, now));

        bucket.refill(capacity, self.refill_rate, now);
        bucket.try_acquire()
    }

    fn remaining_at(&self, client_id: &str, now: Instant) -> u32 {
        match self.buckets.get_mut(client_id) {
            Some(mut bucket) => {
                bucket.refill(f64::from(self.capacity), self.refill_rate, now);
                bucket.tokens.floor() as u32
            }
            None => self.capacity,
        }
    }

    fn reset_time_at(&self, client_id: &str, now: Instant, now_epoch: u64) -> u64 {
        let Some(mut bucket) = self.buckets.get_mut(client_id) else {
            return now_epoch;
        };

        let capacity = f64::from(self.capacity);
        bucket.refill(capacity, self.refill_rate, now);
        let deficit = capacity - bucket.tokens;
        if deficit <= 0.0 || self.refill_rate <= 0.0 {
            return now_epoch;
        }
        now_epoch + (deficit / self.refill_rate).ceil() as u64
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
