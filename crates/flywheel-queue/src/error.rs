//! Queue error types.

use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue '{name}' is full ({limit} pending jobs)")]
    QueueFull { name: String, limit: usize },

    #[error("no handler registered for job type '{0}'")]
    NoHandler(String),
}

impl QueueError {
    pub fn queue_full(name: impl Into<String>, limit: usize) -> Self {
        Self::QueueFull {
            name: name.into(),
            limit,
        }
    }
}
