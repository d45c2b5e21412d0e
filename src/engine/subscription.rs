//! Subscription Guard Module
//!
//! Scoped handle pairing every subscribe with a guaranteed release.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::cache::CacheKey;
use crate::engine::SyncEngine;

// == Subscription ==
/// Live interest in a cache key, returned by [`SyncEngine::subscribe`].
///
/// Dropping the guard releases the subscription, so every exit path --
/// view teardown, navigation, error -- unsubscribes exactly once.
/// [`unsubscribe`](Self::unsubscribe) releases early; calling it again, or
/// dropping afterwards, is a no-op.
///
/// Releasing does not cancel an in-flight fetch for the key: the fetch
/// completes and updates the shared entry for other or future subscribers;
/// only this subscriber stops being notified.
pub struct Subscription {
    engine: SyncEngine,
    key: CacheKey,
    id: u64,
    released: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(engine: SyncEngine, key: CacheKey, id: u64) -> Self {
        Self {
            engine,
            key,
            id,
            released: AtomicBool::new(false),
        }
    }

    /// Returns the key this subscription watches.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    // == Unsubscribe ==
    /// Releases the subscription. Idempotent.
    pub fn unsubscribe(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        self.engine.release(&self.key, self.id);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
