//! In-memory caches used by the evaluators.
//!
//! Each caching evaluator owns its own [`TtlCache`], so entries for the same
//! repository are never shared between metrics. Entries are not evicted
//! proactively: a stale entry reads as absent and is overwritten by the next
//! successful evaluation. Time comes from an injected [`Clock`].

use crate::hosting::AuthorAssociation;
use crate::model::RepoRef;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

// ============================================================================
// Clock
// ============================================================================

/// Source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let by = chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::days(36_500));
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = now.checked_add_signed(by).unwrap_or(*now);
    }

    /// Jump to an absolute time.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// TTL cache
// ============================================================================

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

/// Thread-safe key/value cache where an entry is valid while
/// `now - stored_at < ttl`.
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<V: Clone> TtlCache<V> {
    /// Create an empty cache.
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// The configured time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry<V>, now: DateTime<Utc>) -> bool {
        // A negative age (clock moved backwards) counts as fresh.
        let age = (now - entry.stored_at).to_std().unwrap_or_default();
        age < self.ttl
    }

    /// Get a fresh value for `key`.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let fresh = self
            .entries
            .get(key)
            .filter(|entry| self.is_fresh(entry, now))
            .map(|entry| entry.value.clone());

        if fresh.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        fresh
    }

    /// Store `value` under `key`, stamped with the current time.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            value,
            stored_at: self.clock.now(),
        };
        self.entries.insert(key.into(), entry);
    }

    /// Remove an entry.
    pub fn remove(&self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|(_, entry)| entry.value)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, stale ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cache statistics.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let expired_entries = self
            .entries
            .iter()
            .filter(|entry| !self.is_fresh(entry.value(), now))
            .count();

        CacheStats {
            total_entries: self.entries.len(),
            expired_entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl<V> fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Cache statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Total number of stored entries
    pub total_entries: usize,
    /// Number of stored entries past their TTL
    pub expired_entries: usize,
    /// Lookups answered from the cache
    pub hits: usize,
    /// Lookups that found nothing fresh
    pub misses: usize,
}

// ============================================================================
// Maintainer classification memo
// ============================================================================

/// Process-lifetime memo of "is this login a maintainer of this repository".
///
/// Entries never expire. The first association observed for a login decides.
#[derive(Debug, Default)]
pub struct MaintainerCache {
    entries: DashMap<(String, String), bool>,
}

impl MaintainerCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `login`, consulting and filling the memo.
    pub fn is_maintainer(
        &self,
        repo: &RepoRef,
        login: &str,
        association: AuthorAssociation,
    ) -> bool {
        *self
            .entries
            .entry((repo.cache_key(), login.to_string()))
            .or_insert_with(|| association.is_maintainer())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
