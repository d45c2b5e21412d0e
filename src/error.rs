//! Error types for the synchronization engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Sync Error Enum ==
/// Unified error type for the synchronization engine.
///
/// Failures are captured at the coordinator boundary and stored in the
/// affected cache entry or mutation outcome; they are never thrown across
/// a subscriber callback. A superseded fetch result is not an error at
/// all -- it is simply discarded (visible only in stats and debug logs).
#[derive(Error, Debug)]
pub enum SyncError {
    /// The remote call failed to complete (network failure or non-2xx status)
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The requested resource does not exist in the remote store
    #[error("Not found: {0}")]
    NotFound(String),

    /// A response body could not be decoded into the expected shape
    #[error("Decode failure: {0}")]
    Decode(String),

    /// Invalid outgoing data, rejected before any network call
    #[error("Invalid request: {0}")]
    Invalid(String),
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Decode(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the synchronization engine.
pub type Result<T> = std::result::Result<T, SyncError>;
