//! Domain models for the article catalog
//!
//! Defines the resources exchanged with the remote store. The remote
//! store owns the authoritative copy; the cache holds read-through copies.

pub mod article;

// Re-export commonly used types
pub use article::{Article, ArticleDraft};
