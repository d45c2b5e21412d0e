//! Remote Store Module
//!
//! HTTP client for the remote article store and the adapters that plug it
//! into the engine as fetch and write operations.

pub mod client;

pub use client::{article_key, articles_key, StoreClient};
