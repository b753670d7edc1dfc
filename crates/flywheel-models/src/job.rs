//! Job definitions for queue processing.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job state in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is waiting in the pending list
    #[default]
    Queued,
    /// Job is being executed by its handler
    Active,
    /// Job failed and is waiting out its backoff delay
    Retrying,
    /// Job completed successfully
    Completed,
    /// Job failed permanently (retry budget exhausted or no handler)
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Active => "active",
            JobStatus::Retrying => "retrying",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work tracked by the queue.
///
/// The payload is opaque to the queue; it is handed to the registered
/// handler verbatim. `max_retries` is copied from the queue
/// configuration at submission time so later reconfiguration never
/// affects jobs already in flight.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Job type, selects the registered handler
    pub job_type: String,

    /// Opaque payload passed to the handler
    pub payload: Value,

    /// Higher runs first among queued jobs
    #[serde(default)]
    pub priority: i64,

    /// Execution attempts so far (incremented before each execution)
    #[serde(default)]
    pub attempts: u32,

    /// Retry budget copied from queue config at submission
    #[serde(default)]
    pub max_retries: u32,

    /// Current lifecycle state
    #[serde(default)]
    pub status: JobStatus,

    /// Submission timestamp
    pub created_at: DateTime<Utc>,

    /// Last failure message (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Handler return value, present only when completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl Job {
    /// Create a new job in `Queued` state.
    pub fn new(job_type: impl Into<String>, payload: Value, priority: i64, max_retries: u32) -> Self {
        Self {
            id: JobId::new(),
            job_type: job_type.into(),
            payload,
            priority,
            attempts: 0,
            max_retries,
            status: JobStatus::Queued,
            created_at: Utc::now(),
            error: None,
            result: None,
        }
    }

    /// Begin an execution attempt.
    pub fn start(mut self) -> Self {
        self.attempts += 1;
        self.status = JobStatus::Active;
        self
    }

    /// Mark the job as completed with the handler's return value.
    pub fn complete(mut self, result: Value) -> Self {
        self.status = JobStatus::Completed;
        self.result = Some(result);
        self
    }

    /// Record a failure and park the job for a retry.
    pub fn retrying(mut self, error: impl Into<String>) -> Self {
        self.status = JobStatus::Retrying;
        self.error = Some(error.into());
        self
    }

    /// Re-enter the pending list after the backoff delay.
    pub fn requeue(mut self) -> Self {
        self.status = JobStatus::Queued;
        self
    }

    /// Mark the job as permanently failed.
    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self
    }

    /// Whether another execution attempt fits in the retry budget.
    ///
    /// Attempts are counted at execution start, so a job is retried
    /// while `attempts <= max_retries` and runs at most
    /// `max_retries + 1` times.
    pub fn can_retry(&self) -> bool {
        self.attempts <= self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_creation() {
        let job = Job::new("publish_boost", json!({"product": "sku-1"}), 5, 3);

        assert_eq!(job.job_type, "publish_boost");
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.priority, 5);
        assert_eq!(job.attempts, 0);
        assert!(job.error.is_none());
        assert!(job.result.is_none());
    }

    #[test]
    fn test_job_state_transitions() {
        let job = Job::new("publish_boost", json!({}), 0, 3);

        let started = job.start();
        assert_eq!(started.status, JobStatus::Active);
        assert_eq!(started.attempts, 1);

        let completed = started.complete(json!({"tweet_id": "1"}));
        assert_eq!(completed.status, JobStatus::Completed);
        assert_eq!(completed.result, Some(json!({"tweet_id": "1"})));
        assert!(completed.status.is_terminal());
    }

    #[test]
    fn test_job_retry_budget() {
        let mut job = Job::new("publish_boost", json!({}), 0, 2);

        // Attempts 1 and 2 leave budget for a retry, attempt 3 does not.
        job = job.start();
        assert!(job.can_retry());
        job = job.retrying("rate limited").requeue().start();
        assert!(job.can_retry());
        job = job.retrying("rate limited").requeue().start();
        assert_eq!(job.attempts, 3);
        assert!(!job.can_retry());

        let failed = job.fail("rate limited");
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("rate limited"));
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&JobStatus::Retrying).expect("serialize status");
        assert_eq!(json, "\"retrying\"");
    }
}
