//! artsync - client-side article cache and synchronization engine
//!
//! Keeps a UI's view of a remote article store reasonably fresh with
//! minimal redundant traffic: stale-while-revalidate reads, at most one
//! in-flight fetch per resource, and write-driven invalidation.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod remote;
pub mod tasks;

pub use cache::{CacheKey, EngineStats, EntrySnapshot, FetchStatus, KeyPart};
pub use config::Config;
pub use engine::{Subscription, SyncEngine};
pub use error::{Result, SyncError};
pub use models::{Article, ArticleDraft};
pub use remote::{article_key, articles_key, StoreClient};
pub use tasks::spawn_sweep_task;
