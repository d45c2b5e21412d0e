//! Engine Module
//!
//! The synchronization engine mediating every read and write between views
//! and the remote store: fetch deduplication, stale-while-revalidate
//! subscriptions, and write-driven invalidation.

mod subscription;

pub use subscription::Subscription;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{debug, info};

use crate::cache::{
    current_timestamp_ms, CacheKey, CacheStore, ChangeFn, EngineStats, EntrySnapshot, FetchFn,
    FetchResult, FetchStatus, Notification,
};
use crate::config::Config;
use crate::error::Result;

// == Engine Internals ==
struct Shared {
    /// Single-writer cache state. The lock is never held across an await:
    /// fetch and write futures suspend outside it, and subscriber
    /// callbacks run after it is released.
    state: Mutex<CacheStore>,
    config: Config,
    next_subscription_id: AtomicU64,
}

// == Sync Engine ==
/// Client-side cache and synchronization engine.
///
/// Constructed explicitly at the application's composition root and passed
/// (cloned) to whoever needs it; clones share the same underlying store.
/// All state changes flow through the documented entry transitions --
/// there is no way to mutate a cached entry from outside.
#[derive(Clone)]
pub struct SyncEngine {
    shared: Arc<Shared>,
}

impl SyncEngine {
    // == Constructor ==
    /// Creates an engine with the given configuration and an empty store.
    pub fn new(config: Config) -> Self {
        info!(
            stale_window_ms = config.stale_window_ms,
            idle_eviction_ms = config.idle_eviction_ms,
            "sync engine initialized"
        );
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(CacheStore::new()),
                config,
                next_subscription_id: AtomicU64::new(1),
            }),
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    fn state(&self) -> MutexGuard<'_, CacheStore> {
        // A poisoned lock only means some caller panicked between
        // transitions; the store itself is left in a consistent state.
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Snapshot Read ==
    /// Returns the current snapshot for `key`, if an entry exists.
    ///
    /// Intended for synchronous rendering decisions; no fetch is triggered.
    pub fn get(&self, key: &CacheKey) -> Option<EntrySnapshot> {
        self.state().get(key)
    }

    // == Ensure Fetch ==
    /// Guarantees at most one outstanding fetch for `key`.
    ///
    /// If a fetch is already in flight this is a no-op; the existing
    /// operation's eventual result satisfies all callers. Otherwise the
    /// entry transitions to `Pending` under a fresh token and `fetch` is
    /// started on the runtime. On completion the result is applied only if
    /// the token is still current (stale-response guard) and subscribers
    /// are notified. Failures are stored, never retried automatically.
    pub fn ensure_fetch(&self, key: &CacheKey, fetch: FetchFn) {
        let token;
        {
            let mut state = self.state();
            let already_pending = state
                .peek_mut(key)
                .map(|entry| entry.status == FetchStatus::Pending)
                .unwrap_or(false);
            if already_pending {
                state.stats_mut().record_fetch_deduped();
                debug!(key = %key, "fetch already in flight, deduplicated");
                return;
            }

            let mut started = 0;
            let fetch = fetch.clone();
            let notifications = state.upsert(key.clone(), |entry| {
                entry.fetcher = Some(fetch);
                started = entry.begin_fetch(current_timestamp_ms());
            });
            state.stats_mut().record_fetch_started();
            debug!(key = %key, token = started, "fetch started");
            Self::deliver_after(state, notifications);
            token = started;
        }

        // The fetch operation starts here; the only suspension point is the
        // future itself, inside the spawned task.
        let future = fetch();
        let engine = self.clone();
        let key = key.clone();
        tokio::spawn(async move {
            let result = future.await;
            engine.complete_fetch(&key, token, result);
        });
    }

    /// Applies a completed fetch to the entry that requested it.
    fn complete_fetch(&self, key: &CacheKey, token: u64, result: FetchResult) {
        let mut state = self.state();
        let now = current_timestamp_ms();

        if state.peek_mut(key).is_none() {
            // Entry evicted while this fetch was inert; nothing to update
            state.stats_mut().record_stale_discard();
            debug!(key = %key, token, "fetch completed for evicted entry, discarded");
            return;
        }

        let mut applied = false;
        let notifications = state.upsert(key.clone(), |entry| {
            applied = match result {
                Ok(value) => entry.complete_success(token, value, now),
                Err(err) => {
                    debug!(key = %key, error = %err, "fetch failed");
                    entry.complete_error(token, err, now)
                }
            };
        });

        if applied {
            Self::deliver_after(state, notifications);
        } else {
            state.stats_mut().record_stale_discard();
            debug!(key = %key, token, "stale response discarded");
        }
    }

    // == Subscribe ==
    /// Registers interest in `key` and returns the subscription guard.
    ///
    /// Starts a revalidation unless the entry is already `Pending` or holds
    /// data fetched within the staleness window, then synchronously invokes
    /// `on_change` with the current snapshot so the caller can render a
    /// loading or cached state without waiting. Every subsequent mutation
    /// of the entry notifies all live subscribers in subscription order.
    pub fn subscribe(
        &self,
        key: CacheKey,
        fetch: FetchFn,
        on_change: impl Fn(&EntrySnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        let needs_fetch = {
            let mut state = self.state();
            let stale_window_ms = self.shared.config.stale_window_ms;
            let entry = state.entry_mut(key.clone());
            entry.status != FetchStatus::Pending
                && !entry.is_fresh(current_timestamp_ms(), stale_window_ms)
        };
        // Revalidate first: the initial snapshot below then already reads
        // Pending plus any cached data, one delivery instead of two.
        if needs_fetch {
            self.ensure_fetch(&key, fetch.clone());
        }

        let id = self.shared.next_subscription_id.fetch_add(1, Ordering::Relaxed);
        let on_change: ChangeFn = Arc::new(on_change);
        let snapshot = {
            let mut state = self.state();
            state.add_subscriber(key.clone(), id, on_change.clone(), fetch);
            state.entry_mut(key.clone()).snapshot()
        };
        on_change(&snapshot);

        Subscription::new(self.clone(), key, id)
    }

    /// Releases subscriber `id` of `key`. Called by the subscription guard;
    /// the entry stays cached and becomes eligible for idle eviction once
    /// no subscribers remain.
    pub(crate) fn release(&self, key: &CacheKey, id: u64) {
        self.state().remove_subscriber(key, id);
    }

    // == Mutate ==
    /// Executes a write and propagates its effect on reads.
    ///
    /// The write future runs with no lock held. On failure the error is
    /// returned and the entries for `affected` are left untouched; the
    /// write is not retried. On success, before the outcome is returned,
    /// every affected entry is invalidated (bumping its token, so any
    /// in-flight fetch result lands inert) and a refetch is started for
    /// keys with live subscribers; zero-subscriber keys are marked stale
    /// and refetch on their next subscription.
    pub async fn mutate<W>(&self, write: W, affected: &[CacheKey]) -> Result<Value>
    where
        W: Future<Output = Result<Value>>,
    {
        let value = write.await?;

        for key in affected {
            let refetch = {
                let mut state = self.state();
                state.invalidate(key, current_timestamp_ms())
            };
            match refetch {
                Some(fetch) => {
                    debug!(key = %key, "invalidated, refetching");
                    self.ensure_fetch(key, fetch);
                }
                None => debug!(key = %key, "invalidated, no live subscribers"),
            }
        }

        Ok(value)
    }

    // == Evict Idle ==
    /// Removes zero-subscriber entries idle past the configured window.
    /// Returns the number of entries removed.
    pub fn evict_idle(&self) -> usize {
        let mut state = self.state();
        state.evict_idle(current_timestamp_ms(), self.shared.config.idle_eviction_ms)
    }

    // == Stats ==
    /// Returns a copy of the engine statistics.
    pub fn stats(&self) -> EngineStats {
        self.state().stats()
    }

    /// Returns the current number of cached entries.
    pub fn entry_count(&self) -> usize {
        self.state().len()
    }

    // == Clear ==
    /// Drops every cached entry. Outstanding subscriptions keep their
    /// guards but will no longer receive notifications; releasing them is
    /// a no-op. In-flight fetches complete against the empty store and are
    /// discarded.
    pub fn clear(&self) {
        self.state().clear();
        info!("cache cleared");
    }

    /// Releases the lock, then delivers notifications in order.
    fn deliver_after(state: MutexGuard<'_, CacheStore>, notifications: Vec<Notification>) {
        drop(state);
        for notification in notifications {
            notification.deliver();
        }
    }
}
