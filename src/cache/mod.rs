//! Cache Module
//!
//! Key model, per-key entry state machine, and the in-memory store the
//! coordinators operate on.

mod entry;
mod key;
mod stats;
mod store;


// Re-export public types
pub use entry::{
    current_timestamp_ms, CacheEntry, ChangeFn, EntrySnapshot, FetchFn, FetchFuture, FetchResult,
    FetchStatus,
};
pub use key::{CacheKey, KeyPart};
pub use stats::EngineStats;
pub use store::{CacheStore, Notification};
