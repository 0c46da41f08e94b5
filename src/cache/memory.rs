//! Single-entry review cache with advisory freshness
//!
//! The service caches one logical resource, so there is no key space and no
//! eviction policy: a new batch wholesale-replaces the previous entry.
//! Freshness is advisory; degraded callers may still read an expired entry as
//! last-resort fallback.

use chrono::{DateTime, Duration, Utc};

use crate::data::Review;

/// A cached review batch and when it was stored
#[derive(Debug, Clone)]
struct CacheEntry {
    reviews: Vec<Review>,
    cached_at: DateTime<Utc>,
}

/// Holds at most one live review batch with a fixed time-to-live
///
/// The clock is passed into every freshness check, so tests pin `now` instead
/// of sleeping across the TTL boundary.
#[derive(Debug)]
pub struct ReviewCache {
    entry: Option<CacheEntry>,
    ttl: Duration,
}

impl ReviewCache {
    /// Creates an empty cache with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self { entry: None, ttl }
    }

    /// Whether the cached entry exists and is within its TTL
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        match &self.entry {
            Some(entry) => now - entry.cached_at < self.ttl,
            None => false,
        }
    }

    /// Returns the cached batch iff it is still fresh
    pub fn fresh(&self, now: DateTime<Utc>) -> Option<&[Review]> {
        if self.is_valid(now) {
            self.entry.as_ref().map(|e| e.reviews.as_slice())
        } else {
            None
        }
    }

    /// Returns the cached batch regardless of freshness, if one exists
    pub fn any(&self) -> Option<&[Review]> {
        self.entry.as_ref().map(|e| e.reviews.as_slice())
    }

    /// Age of the cached entry, if one exists
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.entry.as_ref().map(|e| now - e.cached_at)
    }

    /// Stores a batch with the given timestamp, replacing prior contents
    pub fn set(&mut self, reviews: Vec<Review>, cached_at: DateTime<Utc>) {
        self.entry = Some(CacheEntry { reviews, cached_at });
    }
}
