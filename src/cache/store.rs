//! Cache Store Module
//!
//! Owns the mapping from cache key to entry and the read/update operations
//! the coordinators build on.

use std::collections::HashMap;

use crate::cache::entry::Subscriber;
use crate::cache::{CacheEntry, CacheKey, ChangeFn, EngineStats, EntrySnapshot, FetchFn, FetchStatus};

// == Notification ==
/// One pending subscriber delivery: a callback paired with the snapshot it
/// should receive.
///
/// Mutating operations collect these inside the critical section and the
/// engine delivers them right after releasing the lock, before the
/// mutating call returns. Per-key subscription order is preserved.
pub struct Notification {
    on_change: ChangeFn,
    snapshot: EntrySnapshot,
}

impl Notification {
    /// Invokes the subscriber callback with its snapshot.
    pub fn deliver(self) {
        (self.on_change)(&self.snapshot);
    }
}

// == Cache Store ==
/// In-memory mapping from cache key to entry, plus engine statistics.
///
/// The store itself is single-writer: it is only ever mutated behind the
/// engine's lock, so every operation here is atomic from the point of view
/// of subscribers and coordinators.
pub struct CacheStore {
    /// Key-entry storage
    entries: HashMap<CacheKey, CacheEntry>,
    /// Engine statistics
    stats: EngineStats,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            stats: EngineStats::new(),
        }
    }

    // == Get ==
    /// Looks up the entry for a key and returns its snapshot.
    ///
    /// Records a hit or miss in the statistics; the entry itself is not
    /// modified.
    pub fn get(&mut self, key: &CacheKey) -> Option<EntrySnapshot> {
        match self.entries.get(key) {
            Some(entry) => {
                self.stats.record_hit();
                Some(entry.snapshot())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Upsert ==
    /// Applies `updater` to the entry for `key`, inserting a fresh `Idle`
    /// entry first if none exists.
    ///
    /// Returns the notifications owed to the key's subscribers, in
    /// subscription order, for delivery once the lock is released.
    pub fn upsert(
        &mut self,
        key: CacheKey,
        updater: impl FnOnce(&mut CacheEntry),
    ) -> Vec<Notification> {
        let entry = self.entry_mut(key);
        updater(entry);
        let snapshot = entry.snapshot();
        let notifications = entry
            .subscribers
            .iter()
            .map(|s| Notification {
                on_change: s.on_change.clone(),
                snapshot: snapshot.clone(),
            })
            .collect();
        self.stats.set_total_entries(self.entries.len());
        notifications
    }

    // == Evict Idle ==
    /// Removes entries with zero subscribers whose last transition
    /// predates the idle window. Entries with an in-flight fetch are never
    /// removed.
    ///
    /// Returns the number of entries removed.
    pub fn evict_idle(&mut self, now: u64, idle_window_ms: u64) -> usize {
        let idle_keys: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| {
                entry.subscribers.is_empty()
                    && entry.status != FetchStatus::Pending
                    && now.saturating_sub(entry.touched) >= idle_window_ms
            })
            .map(|(key, _)| key.clone())
            .collect();

        let count = idle_keys.len();
        for key in idle_keys {
            self.entries.remove(&key);
            self.stats.record_eviction();
        }
        self.stats.set_total_entries(self.entries.len());
        count
    }

    // == Clear ==
    /// Drops every entry. Used for engine teardown and test setup.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.set_total_entries(0);
    }

    // == Stats ==
    /// Returns a copy of the current statistics.
    pub fn stats(&self) -> EngineStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Crate-Internal Operations ==

    /// Returns the entry for `key`, inserting a fresh `Idle` one if absent.
    pub(crate) fn entry_mut(&mut self, key: CacheKey) -> &mut CacheEntry {
        let now = super::current_timestamp_ms();
        self.entries.entry(key).or_insert_with(|| CacheEntry::idle(now))
    }

    /// Returns the entry for `key` without inserting.
    pub(crate) fn peek_mut(&mut self, key: &CacheKey) -> Option<&mut CacheEntry> {
        self.entries.get_mut(key)
    }

    pub(crate) fn stats_mut(&mut self) -> &mut EngineStats {
        &mut self.stats
    }

    /// Registers a subscriber on the entry for `key`, creating the entry
    /// if needed, and records its fetch operation for later
    /// invalidation-driven refetches.
    pub(crate) fn add_subscriber(
        &mut self,
        key: CacheKey,
        id: u64,
        on_change: ChangeFn,
        fetcher: FetchFn,
    ) {
        let entry = self.entry_mut(key);
        entry.fetcher = Some(fetcher);
        entry.subscribers.push(Subscriber { id, on_change });
        self.stats.set_total_entries(self.entries.len());
    }

    /// Removes the subscriber `id` from the entry for `key`, if either
    /// still exists. The entry stays cached and becomes eligible for idle
    /// eviction once its subscriber count reaches zero.
    pub(crate) fn remove_subscriber(&mut self, key: &CacheKey, id: u64) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.subscribers.retain(|s| s.id != id);
            if entry.subscribers.is_empty() {
                // Idle clock starts at the last unsubscribe
                entry.touched = super::current_timestamp_ms();
            }
        }
    }

    /// Invalidates the entry for `key` after a successful write.
    ///
    /// Returns the entry's registered fetch operation when a refetch
    /// should be started immediately (live subscribers present); `None`
    /// when the entry is unknown or merely marked stale for the next
    /// subscription.
    pub(crate) fn invalidate(&mut self, key: &CacheKey, now: u64) -> Option<FetchFn> {
        let entry = self.entries.get_mut(key)?;
        entry.invalidate(now);
        let refetch = if entry.subscribers.is_empty() {
            None
        } else {
            entry.fetcher.clone()
        };
        self.stats.record_invalidation();
        refetch
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::current_timestamp_ms;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn noop() -> ChangeFn {
        Arc::new(|_| {})
    }

    fn never_fetch() -> FetchFn {
        Arc::new(|| Box::pin(async { Ok(json!(null)) }))
    }

    #[test]
    fn test_store_new() {
        let store = CacheStore::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_records_hit_and_miss() {
        let mut store = CacheStore::new();
        let key = CacheKey::new(["articles"]);

        assert!(store.get(&key).is_none());

        store.upsert(key.clone(), |entry| {
            let token = entry.begin_fetch(10);
            entry.complete_success(token, json!([]), 20);
        });
        assert!(store.get(&key).is_some());

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_upsert_creates_idle_entry() {
        let mut store = CacheStore::new();
        let key = CacheKey::new(["articles"]);

        let mut seen = None;
        store.upsert(key.clone(), |entry| {
            seen = Some(entry.status);
        });
        assert_eq!(seen, Some(FetchStatus::Idle));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_upsert_notifies_subscribers_in_order() {
        let mut store = CacheStore::new();
        let key = CacheKey::new(["articles"]);
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        for tag in [1u8, 2, 3] {
            let order = order.clone();
            store.add_subscriber(
                key.clone(),
                tag as u64,
                Arc::new(move |_| order.lock().unwrap().push(tag)),
                never_fetch(),
            );
        }

        let notifications = store.upsert(key, |entry| {
            entry.begin_fetch(10);
        });
        for n in notifications {
            n.deliver();
        }
        assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_evict_idle_removes_only_idle_entries() {
        let mut store = CacheStore::new();
        let now = current_timestamp_ms();

        // Entry with a subscriber stays
        store.add_subscriber(CacheKey::new(["subscribed"]), 1, noop(), never_fetch());
        // Pending entry stays
        store.upsert(CacheKey::new(["pending"]), |entry| {
            entry.begin_fetch(now);
        });
        // Plain idle entry goes
        store.upsert(CacheKey::new(["idle"]), |_| {});

        let removed = store.evict_idle(now + 10, 0);
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().evictions, 1);

        assert!(store.peek_mut(&CacheKey::new(["idle"])).is_none());
        assert!(store.peek_mut(&CacheKey::new(["pending"])).is_some());
        assert!(store.peek_mut(&CacheKey::new(["subscribed"])).is_some());
    }

    #[test]
    fn test_evict_idle_respects_window() {
        let mut store = CacheStore::new();
        let now = current_timestamp_ms();
        store.upsert(CacheKey::new(["recent"]), |_| {});

        // Entry was touched roughly `now`; a wide window keeps it
        assert_eq!(store.evict_idle(now, 60_000), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_subscriber_keeps_entry() {
        let mut store = CacheStore::new();
        let key = CacheKey::new(["articles"]);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_cb = calls.clone();

        store.add_subscriber(
            key.clone(),
            7,
            Arc::new(move |_| {
                calls_cb.fetch_add(1, Ordering::SeqCst);
            }),
            never_fetch(),
        );
        store.remove_subscriber(&key, 7);

        // Entry survives, but the released subscriber is no longer notified
        assert_eq!(store.len(), 1);
        let notifications = store.upsert(key, |entry| {
            entry.begin_fetch(10);
        });
        assert!(notifications.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_remove_subscriber_unknown_key_is_noop() {
        let mut store = CacheStore::new();
        store.remove_subscriber(&CacheKey::new(["nope"]), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_invalidate_unknown_key() {
        let mut store = CacheStore::new();
        assert!(store.invalidate(&CacheKey::new(["nope"]), 10).is_none());
        assert_eq!(store.stats().invalidations, 0);
    }

    #[test]
    fn test_invalidate_returns_fetcher_only_with_subscribers() {
        let mut store = CacheStore::new();
        let key = CacheKey::new(["articles"]);

        store.upsert(key.clone(), |entry| {
            let token = entry.begin_fetch(10);
            entry.complete_success(token, json!([]), 20);
        });
        // No subscribers: marked stale, no refetch
        assert!(store.invalidate(&key, 30).is_none());
        assert_eq!(store.stats().invalidations, 1);

        store.add_subscriber(key.clone(), 1, noop(), never_fetch());
        assert!(store.invalidate(&key, 40).is_some());
    }

    #[test]
    fn test_clear() {
        let mut store = CacheStore::new();
        store.upsert(CacheKey::new(["a"]), |_| {});
        store.upsert(CacheKey::new(["b"]), |_| {});

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.stats().total_entries, 0);
    }
}
