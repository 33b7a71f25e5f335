// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory response cache with per-entry time-to-live
//!
//! Entries are keyed by the fully built request URL, so two requests share an
//! entry only when every query parameter matches. Expiry is lazy: a stale entry
//! is removed by the read that observes it.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, trace};

/// A cached value with its storage time and lifetime
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When the value was stored
    pub stored_at: Instant,
    /// How long the value stays fresh
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
            ttl,
        }
    }

    /// Whether the entry may still be served
    pub fn is_fresh(&self) -> bool {
        self.stored_at.elapsed() < self.ttl
    }
}

/// Counters describing cache effectiveness
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    /// Entries currently held, fresh or not yet observed stale
    pub entry_count: usize,
    /// Reads answered from the cache
    pub hits: u64,
    /// Reads that found nothing usable
    pub misses: u64,
    /// Stale entries removed on read
    pub expired: u64,
    /// Writes
    pub stores: u64,
    /// `hits / (hits + misses)`, zero before the first read
    pub hit_rate: f64,
}

/// Key/value cache where every entry carries its own TTL
#[derive(Debug)]
pub struct ResponseCache<V = serde_json::Value> {
    entries: DashMap<String, CacheEntry<V>>,
    stats: DashMap<&'static str, u64>,
}

impl<V> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ResponseCache<V> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            stats: DashMap::new(),
        }
    }

    /// Store `value` under `key`, replacing any previous entry
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        trace!(key = %key, ttl_ms = ttl.as_millis(), "storing cache entry");
        self.entries.insert(key, CacheEntry::new(value, ttl));
        self.increment_stat("stores");
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
        debug!("cleared response cache");
    }

    /// Number of entries held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the cache counters
    pub fn stats(&self) -> CacheStats {
        let hits = self.stat("hits");
        let misses = self.stat("misses");
        let total = hits + misses;
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            entry_count: self.entries.len(),
            hits,
            misses,
            expired: self.stat("expired"),
            stores: self.stat("stores"),
            hit_rate,
        }
    }

    fn increment_stat(&self, key: &'static str) {
        *self.stats.entry(key).or_insert(0) += 1;
    }

    fn stat(&self, key: &'static str) -> u64 {
        self.stats.get(key).map_or(0, |v| *v)
    }
}

impl<V: Clone> ResponseCache<V> {
    /// Fetch a fresh value, removing the entry if it has expired
    pub fn get(&self, key: &str) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_fresh() => {
                let value = entry.value.clone();
                drop(entry);
                self.increment_stat("hits");
                trace!(key, "cache hit");
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            // a concurrent writer may have refreshed the entry in between
            if self.entries.remove_if(key, |_, entry| !entry.is_fresh()).is_some() {
                self.increment_stat("expired");
                debug!(key, "expired cache entry removed");
            }
        }

        self.increment_stat("misses");
        None
    }
}
