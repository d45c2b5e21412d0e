//! Engine Statistics Module
//!
//! Tracks cache and fetch-coordination metrics.

use serde::Serialize;

// == Engine Stats ==
/// Counters for cache effectiveness and fetch coordination.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineStats {
    /// Snapshot reads that found an entry
    pub hits: u64,
    /// Snapshot reads that found nothing
    pub misses: u64,
    /// Fetches actually started
    pub fetches_started: u64,
    /// Fetch requests absorbed by an already in-flight fetch
    pub fetches_deduped: u64,
    /// Completed fetches discarded by the stale-response guard
    pub stale_responses_discarded: u64,
    /// Entries invalidated by successful mutations
    pub invalidations: u64,
    /// Entries removed by idle eviction
    pub evictions: u64,
    /// Current number of entries in the store
    pub total_entries: usize,
}

impl EngineStats {
    // == Constructor ==
    /// Creates a new EngineStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Recorders ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_fetch_started(&mut self) {
        self.fetches_started += 1;
    }

    pub fn record_fetch_deduped(&mut self) {
        self.fetches_deduped += 1;
    }

    pub fn record_stale_discard(&mut self) {
        self.stale_responses_discarded += 1;
    }

    pub fn record_invalidation(&mut self) {
        self.invalidations += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
