//! Queue configuration.

use std::time::Duration;

/// Queue configuration, fixed at construction.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Queue label for logging/metrics
    pub name: String,
    /// Max simultaneously active jobs
    pub concurrency: usize,
    /// Max retry attempts after the first failure
    pub retries: u32,
    /// Base backoff unit. The delay before the Nth retry is
    /// `retry_delay * N`, linear in the attempt number rather than
    /// exponential.
    pub retry_delay: Duration,
    /// How many finished jobs stay retrievable by id
    pub history_limit: usize,
    /// Reject submissions once this many jobs are pending.
    /// `None` means unbounded.
    pub max_pending: Option<usize>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            concurrency: 2,
            retries: 3,
            retry_delay: Duration::from_millis(5000),
            history_limit: 100,
            max_pending: None,
        }
    }
}

impl QueueConfig {
    /// Create a config with the given queue name and default tuning.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create config from environment variables.
    pub fn from_env(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            concurrency: std::env::var("FLYWHEEL_QUEUE_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            retries: std::env::var("FLYWHEEL_QUEUE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            retry_delay: Duration::from_millis(
                std::env::var("FLYWHEEL_QUEUE_RETRY_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5000),
            ),
            history_limit: std::env::var("FLYWHEEL_QUEUE_HISTORY_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
            max_pending: std::env::var("FLYWHEEL_QUEUE_MAX_PENDING")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }

    /// Set the concurrency cap.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the retry budget.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the base backoff unit.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Set the history size.
    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    /// Bound the pending list, rejecting submissions beyond the limit.
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = Some(max_pending);
        self
    }
}
