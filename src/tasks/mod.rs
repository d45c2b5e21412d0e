//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the engine is
//! embedded in an application.
//!
//! # Tasks
//! - Idle sweep: removes zero-subscriber cache entries at configured intervals

mod sweep;

pub use sweep::spawn_sweep_task;
