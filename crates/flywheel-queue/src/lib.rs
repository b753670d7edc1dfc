//! In-process job queue for FlyWheel.
//!
//! This crate provides:
//! - Priority-ordered job submission with bounded concurrency
//! - Per-job retry with linear backoff
//! - Bounded job history for status lookup by id

pub mod config;
pub mod error;
pub mod handler;
pub mod queue;

pub use config::QueueConfig;
pub use error::{QueueError, QueueResult};
pub use handler::{FnHandler, HandlerResult, JobHandler};
pub use queue::JobQueue;
