//! Bounded, TTL-expiring in-memory cache of AQI records
//!
//! Provides a `LookupCache` keyed by normalized city identifier. Entries
//! expire lazily: staleness is only discovered when an entry is read, and
//! space is only reclaimed when a new entry is written. Eviction removes the
//! entry that was populated longest ago; reads never refresh an entry's age.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::clock::{Clock, SystemClock};
use crate::data::AqiRecord;

/// Default time-to-live for cache entries in seconds
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Default maximum number of cache entries
pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// A stored record and when it was populated
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The cached record
    record: AqiRecord,
    /// When the entry was last fully populated
    inserted_at: DateTime<Utc>,
    /// Insertion sequence, breaks ties between equal timestamps
    seq: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    next_seq: u64,
}

impl CacheState {
    /// Removes the entry with the oldest population time
    fn evict_oldest(&mut self) -> Option<String> {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.inserted_at, entry.seq))
            .map(|(key, _)| key.clone())?;
        self.entries.remove(&oldest);
        Some(oldest)
    }
}

/// Shared in-memory cache of normalized AQI records
///
/// All operations take the internal lock for their full duration, so the
/// entry count never exceeds the capacity and a key never appears twice,
/// whatever the interleaving of callers.
pub struct LookupCache {
    state: Mutex<CacheState>,
    ttl: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl LookupCache {
    /// Creates a cache using wall-clock time
    ///
    /// A `max_entries` of zero is treated as one.
    pub fn new(ttl: std::time::Duration, max_entries: usize) -> Self {
        Self::with_clock(ttl, max_entries, Arc::new(SystemClock))
    }

    /// Creates a cache reading time from `clock`
    pub fn with_clock(ttl: std::time::Duration, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        let ttl = Duration::from_std(ttl).unwrap_or(Duration::MAX);
        Self {
            state: Mutex::new(CacheState::default()),
            ttl,
            max_entries: max_entries.max(1),
            clock,
        }
    }

    /// Returns the record stored for `key` if it is still fresh
    ///
    /// A stale entry is removed as a side effect and reported as missing.
    pub async fn get(&self, key: &str) -> Option<AqiRecord> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        let entry = state.entries.get(key)?;
        if now - entry.inserted_at > self.ttl {
            state.entries.remove(key);
            tracing::info!(key, "Cache EXPIRED");
            return None;
        }

        tracing::info!(key, "Cache HIT");
        Some(entry.record.clone())
    }

    /// Stores `record` under `key`, replacing any previous entry
    ///
    /// When the cache is at capacity the oldest-populated entry is evicted
    /// first, so the size grows by at most one per call.
    pub async fn put(&self, key: impl Into<String>, record: AqiRecord) {
        let key = key.into();
        let mut state = self.state.lock().await;

        if state.entries.len() >= self.max_entries {
            if let Some(evicted) = state.evict_oldest() {
                tracing::info!(key = %evicted, "Evicted oldest cache entry");
            }
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        let entry = CacheEntry {
            record,
            inserted_at: self.clock.now(),
            seq,
        };
        state.entries.insert(key.clone(), entry);

        tracing::info!(
            key = %key,
            size = state.entries.len(),
            max_entries = self.max_entries,
            "Cache updated"
        );
    }

    /// Number of entries held, including stale ones not yet read
    pub async fn size(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    /// Maximum number of entries the cache holds
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Time-to-live applied to entries
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for LookupCache {
    fn default() -> Self {
        Self::new(
            std::time::Duration::from_secs(DEFAULT_TTL_SECS),
            DEFAULT_MAX_ENTRIES,
        )
    }
}

impl std::fmt::Debug for LookupCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupCache")
            .field("ttl", &self.ttl)
            .field("max_entries", &self.max_entries)
            .finish_non_exhaustive()
    }
}
