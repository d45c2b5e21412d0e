//! Cache Entry Module
//!
//! Defines the per-key entry state machine with in-flight token tracking.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, SyncError};

// == Callback Types ==
/// Result of one remote read.
pub type FetchResult = Result<Value>;

/// In-flight remote read.
pub type FetchFuture = Pin<Box<dyn Future<Output = FetchResult> + Send>>;

/// Caller-supplied fetch operation. Each invocation issues one remote read.
pub type FetchFn = Arc<dyn Fn() -> FetchFuture + Send + Sync>;

/// Subscriber callback, invoked with an entry snapshot on every mutation
/// of the subscribed key.
pub type ChangeFn = Arc<dyn Fn(&EntrySnapshot) + Send + Sync>;

// == Fetch Status ==
/// Lifecycle state of a cache entry.
///
/// `Idle` is initial; there is no terminal state. Entries cycle
/// `Pending -> Success | Error -> Pending` for as long as they are
/// referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// No fetch has been requested yet
    Idle,
    /// A fetch is in flight
    Pending,
    /// The last fetch completed with data
    Success,
    /// The last fetch failed
    Error,
}

// == Subscriber ==
/// One registered subscriber of a key, notified in registration order.
#[derive(Clone)]
pub(crate) struct Subscriber {
    pub id: u64,
    pub on_change: ChangeFn,
}

// == Cache Entry ==
/// One entry per distinct cache key.
///
/// `token` identifies the currently relevant fetch: it is bumped whenever
/// a fetch starts and whenever the entry is invalidated. A completing
/// fetch may only write its result back if it still holds the current
/// token, so a response superseded by an invalidation lands inert instead
/// of overwriting newer state.
pub struct CacheEntry {
    /// Current lifecycle state
    pub status: FetchStatus,
    /// Last successfully fetched value, kept through refetches and errors
    pub data: Option<Arc<Value>>,
    /// Last failure reason, present only in `Error`
    pub error: Option<Arc<SyncError>>,
    /// Timestamp of the last successful fetch (Unix milliseconds)
    pub fetched_at: Option<u64>,
    /// Token of the fetch whose result is still welcome
    pub token: u64,
    /// Timestamp of the last transition, drives idle eviction
    pub touched: u64,
    /// Live subscribers in subscription order
    pub(crate) subscribers: Vec<Subscriber>,
    /// Most recently registered fetch operation, reused for
    /// invalidation-driven refetches
    pub(crate) fetcher: Option<FetchFn>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a fresh entry in the `Idle` state.
    pub fn idle(now: u64) -> Self {
        Self {
            status: FetchStatus::Idle,
            data: None,
            error: None,
            fetched_at: None,
            token: 0,
            touched: now,
            subscribers: Vec::new(),
            fetcher: None,
        }
    }

    // == Subscriber Count ==
    /// Number of active subscriptions for this key.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    // == Begin Fetch ==
    /// Transitions to `Pending` under a new token and returns that token.
    ///
    /// Cached `data` is kept so subscribers can keep rendering it while the
    /// refetch resolves; a previous failure reason is cleared because the
    /// entry is no longer in `Error`.
    pub fn begin_fetch(&mut self, now: u64) -> u64 {
        self.token += 1;
        self.status = FetchStatus::Pending;
        self.error = None;
        self.touched = now;
        self.token
    }

    // == Complete Success ==
    /// Applies a successful fetch result if `token` is still current.
    ///
    /// Returns `false` when the result arrived stale (superseded by an
    /// invalidation or a newer fetch) and was discarded without touching
    /// the entry.
    pub fn complete_success(&mut self, token: u64, value: Value, now: u64) -> bool {
        if token != self.token {
            return false;
        }
        self.status = FetchStatus::Success;
        self.data = Some(Arc::new(value));
        self.error = None;
        self.fetched_at = Some(now);
        self.touched = now;
        true
    }

    // == Complete Error ==
    /// Applies a failed fetch result if `token` is still current.
    ///
    /// The last successful `data` survives so a view can keep rendering it
    /// next to a retry affordance. Failures are not retried here; the next
    /// explicit fetch request re-attempts.
    pub fn complete_error(&mut self, token: u64, err: SyncError, now: u64) -> bool {
        if token != self.token {
            return false;
        }
        self.status = FetchStatus::Error;
        self.error = Some(Arc::new(err));
        self.touched = now;
        true
    }

    // == Invalidate ==
    /// Marks the entry as requiring a refetch after a successful write.
    ///
    /// Bumps the token so any in-flight result is discarded on arrival and
    /// clears freshness. A `Pending` entry falls back to `Success` (data
    /// present) or `Idle`: its outstanding fetch can no longer complete it,
    /// and the key must not be left waiting on a result that will never
    /// land.
    pub fn invalidate(&mut self, now: u64) {
        self.token += 1;
        self.fetched_at = None;
        self.touched = now;
        if self.status == FetchStatus::Pending {
            self.status = if self.data.is_some() {
                FetchStatus::Success
            } else {
                FetchStatus::Idle
            };
        }
    }

    // == Is Fresh ==
    /// Whether the entry holds data fetched within the staleness window.
    ///
    /// Boundary condition: data is stale once its age reaches the window,
    /// mirroring TTL expiry where elapsed == limit counts as expired.
    pub fn is_fresh(&self, now: u64, stale_window_ms: u64) -> bool {
        self.status == FetchStatus::Success
            && self
                .fetched_at
                .map(|at| now.saturating_sub(at) < stale_window_ms)
                .unwrap_or(false)
    }

    // == Snapshot ==
    /// Captures the subscriber-facing view of the entry.
    pub fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            fetched_at: self.fetched_at,
        }
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("status", &self.status)
            .field("has_data", &self.data.is_some())
            .field("fetched_at", &self.fetched_at)
            .field("token", &self.token)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

// == Entry Snapshot ==
/// Read-only view of a cache entry delivered to subscribers and snapshot
/// readers.
///
/// Always a normal value, even for failures: `status == Error` plus
/// `error` signal a failed fetch, so views render without
/// exception-handling logic.
#[derive(Debug, Clone)]
pub struct EntrySnapshot {
    /// Lifecycle state at capture time
    pub status: FetchStatus,
    /// Last successfully fetched value, if any
    pub data: Option<Arc<Value>>,
    /// Last failure reason, present only in `Error`
    pub error: Option<Arc<SyncError>>,
    /// Timestamp of the last successful fetch (Unix milliseconds)
    pub fetched_at: Option<u64>,
}

impl EntrySnapshot {
    /// Decodes the cached value into a typed resource.
    ///
    /// Returns `None` when no data has been fetched yet.
    pub fn decode<T: DeserializeOwned>(&self) -> Option<Result<T>> {
        self.data
            .as_ref()
            .map(|value| serde_json::from_value(value.as_ref().clone()).map_err(SyncError::from))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
