//! Configuration Module
//!
//! Handles loading and managing engine configuration from environment variables.

use std::env;

/// Engine configuration parameters.
///
/// The refetch heuristics usually hidden inside query libraries are plain
/// knobs here: `stale_window_ms` controls the stale-while-revalidate
/// threshold, `idle_eviction_ms` controls entry removal after the last
/// unsubscribe. All values can be configured via environment variables
/// with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote article store
    pub store_base_url: String,
    /// How long a successful fetch counts as fresh, in milliseconds
    pub stale_window_ms: u64,
    /// How long a zero-subscriber entry survives before eviction, in milliseconds
    pub idle_eviction_ms: u64,
    /// Background eviction sweep interval in milliseconds
    pub sweep_interval_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `STORE_BASE_URL` - Remote store base URL (default: http://localhost:3001)
    /// - `STALE_WINDOW_MS` - Freshness window in ms (default: 30000)
    /// - `IDLE_EVICTION_MS` - Idle eviction window in ms (default: 60000)
    /// - `SWEEP_INTERVAL_MS` - Sweep frequency in ms (default: 5000)
    pub fn from_env() -> Self {
        Self {
            store_base_url: env::var("STORE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
            stale_window_ms: env::var("STALE_WINDOW_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30_000),
            idle_eviction_ms: env::var("IDLE_EVICTION_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60_000),
            sweep_interval_ms: env::var("SWEEP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5_000),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_base_url: "http://localhost:3001".to_string(),
            stale_window_ms: 30_000,
            idle_eviction_ms: 60_000,
            sweep_interval_ms: 5_000,
        }
    }
}
