//! Shared data models for the FlyWheel job queue.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and their lifecycle states
//! - Queue statistics reported to callers

pub mod job;
pub mod stats;

// Re-export common types
pub use job::{Job, JobId, JobStatus};
pub use stats::QueueStats;
