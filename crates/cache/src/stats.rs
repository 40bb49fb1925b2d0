//! Cache statistics and metrics tracking
//!
//! Counters are plain relaxed atomics. Recording is a no-op unless the cache
//! was configured with `track_metrics`.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Statistics snapshot for cache performance monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Current number of entries
    pub size: usize,

    /// Maximum allowed entries
    pub capacity: usize,

    /// Lookups answered from the cache
    pub hits: u64,

    /// Lookups that had to wait for a fetch
    pub misses: u64,

    /// Entries inserted or refreshed by a completed fetch
    pub inserts: u64,

    /// Entries dropped to stay within capacity
    pub evictions: u64,

    /// Entries dropped because their expiration window passed
    pub expirations: u64,

    /// Fetches started
    pub fetches: u64,

    /// Fetches that failed or panicked
    pub fetch_failures: u64,

    /// Misses that joined an in-flight fetch instead of starting one
    pub deduplicated: u64,
}

impl CacheStats {
    /// Calculate hit rate (hits / total accesses)
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Calculate miss rate (misses / total accesses)
    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }

    /// Calculate fill percentage (size / capacity)
    pub fn fill_percentage(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.size as f64 / self.capacity as f64
        }
    }

    /// Total number of access operations (hits + misses)
    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Thread-safe metrics collector for cache operations
#[derive(Debug, Default)]
pub(crate) struct MetricsCollector {
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    fetches: AtomicU64,
    fetch_failures: AtomicU64,
    deduplicated: AtomicU64,
}

impl MetricsCollector {
    /// Create a collector; a disabled one ignores every record call.
    pub(crate) fn new(enabled: bool) -> Self {
        Self { enabled, ..Self::default() }
    }

    fn bump(&self, counter: &AtomicU64) {
        if self.enabled {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_hit(&self) {
        self.bump(&self.hits);
    }

    pub(crate) fn record_miss(&self) {
        self.bump(&self.misses);
    }

    pub(crate) fn record_insert(&self) {
        self.bump(&self.inserts);
    }

    pub(crate) fn record_eviction(&self) {
        self.bump(&self.evictions);
    }

    pub(crate) fn record_expiration(&self) {
        self.bump(&self.expirations);
    }

    pub(crate) fn record_fetch(&self) {
        self.bump(&self.fetches);
    }

    pub(crate) fn record_fetch_failure(&self) {
        self.bump(&self.fetch_failures);
    }

    pub(crate) fn record_deduplicated(&self) {
        self.bump(&self.deduplicated);
    }

    /// Get current statistics snapshot
    pub(crate) fn snapshot(&self, size: usize, capacity: usize) -> CacheStats {
        CacheStats {
            size,
            capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            deduplicated: self.deduplicated.load(Ordering::Relaxed),
        }
    }

    /// Reset all metrics to zero
    pub(crate) fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.inserts,
            &self.evictions,
            &self.expirations,
            &self.fetches,
            &self.fetch_failures,
            &self.deduplicated,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
