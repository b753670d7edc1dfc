//! In-process priority job queue with retry backoff.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use flywheel_models::{Job, JobId, QueueStats};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::QueueConfig;
use crate::error::{QueueError, QueueResult};
use crate::handler::{FnHandler, HandlerResult, JobHandler};

/// Mutable queue state. Guarded by a single lock that is never held
/// across a handler await.
struct QueueState {
    /// Pending jobs, descending priority, FIFO among equal priorities
    pending: VecDeque<Job>,
    /// Snapshot of every tracked job, keyed by id
    history: HashMap<String, Job>,
    /// History insertion order, oldest first (drives eviction)
    history_order: VecDeque<String>,
    /// Jobs currently being executed
    active: usize,
    /// Lifetime completed count
    processed: u64,
    /// Lifetime permanently-failed count
    failed: u64,
}

impl QueueState {
    fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            history: HashMap::new(),
            history_order: VecDeque::new(),
            active: 0,
            processed: 0,
            failed: 0,
        }
    }

    /// Insert keeping descending priority order. Equal priorities keep
    /// submission order: the new job goes behind existing peers.
    fn insert_by_priority(&mut self, job: Job) {
        let pos = self
            .pending
            .iter()
            .position(|queued| queued.priority < job.priority)
            .unwrap_or(self.pending.len());
        self.pending.insert(pos, job);
    }

    /// Track a newly submitted job, evicting the oldest entries beyond
    /// the history limit.
    fn record(&mut self, job: &Job, limit: usize) {
        if self.history.insert(job.id.0.clone(), job.clone()).is_none() {
            self.history_order.push_back(job.id.0.clone());
        }
        while self.history_order.len() > limit {
            if let Some(evicted) = self.history_order.pop_front() {
                self.history.remove(&evicted);
            }
        }
    }

    /// Refresh the history snapshot of a job, if it is still tracked.
    fn sync(&mut self, job: &Job) {
        if let Some(entry) = self.history.get_mut(job.id.as_str()) {
            *entry = job.clone();
        }
    }
}

struct QueueCore {
    config: QueueConfig,
    handlers: RwLock<HashMap<String, Arc<dyn JobHandler>>>,
    state: Mutex<QueueState>,
}

/// In-memory, priority-ordered job queue with bounded concurrency.
///
/// One instance is created per logical queue (e.g. "boosts") and lives
/// for the process lifetime; clones share the same underlying state, so
/// the handle can be passed freely to submitters and status pollers.
/// Nothing is persisted; all job data is lost on restart.
///
/// Failure is never reported synchronously: a job that errors is
/// retried with linear backoff until its budget is exhausted, and its
/// terminal state and last error stay readable via [`JobQueue::status`]
/// for as long as the job remains in history.
#[derive(Clone)]
pub struct JobQueue {
    core: Arc<QueueCore>,
}

impl JobQueue {
    /// Create a new queue.
    pub fn new(config: QueueConfig) -> Self {
        Self {
            core: Arc::new(QueueCore {
                config,
                handlers: RwLock::new(HashMap::new()),
                state: Mutex::new(QueueState::new()),
            }),
        }
    }

    /// Queue label.
    pub fn name(&self) -> &str {
        &self.core.config.name
    }

    /// Associate a handler with a job type.
    ///
    /// One handler per type; a later registration silently replaces the
    /// earlier one. Submitting a type with no handler is not rejected
    /// here; the job fails at execution time instead.
    pub async fn register_handler(&self, job_type: impl Into<String>, handler: Arc<dyn JobHandler>) {
        let job_type = job_type.into();
        let mut handlers = self.core.handlers.write().await;
        if handlers.insert(job_type.clone(), handler).is_some() {
            debug!(
                queue = %self.core.config.name,
                job_type = %job_type,
                "Replaced existing handler"
            );
        }
    }

    /// Register an async closure as the handler for a job type.
    pub async fn register_fn<F, Fut>(&self, job_type: impl Into<String>, f: F)
    where
        F: Fn(Value, Job) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register_handler(job_type, Arc::new(FnHandler(f))).await;
    }

    /// Submit a job with default priority 0.
    pub async fn submit(&self, job_type: impl Into<String>, payload: Value) -> QueueResult<Job> {
        self.submit_with_priority(job_type, payload, 0).await
    }

    /// Submit a job. Returns a snapshot immediately; execution happens
    /// asynchronously. The payload is passed through opaquely, without
    /// validation.
    pub async fn submit_with_priority(
        &self,
        job_type: impl Into<String>,
        payload: Value,
        priority: i64,
    ) -> QueueResult<Job> {
        let job = Job::new(job_type, payload, priority, self.core.config.retries);

        {
            let mut state = self.core.state.lock().await;
            if let Some(limit) = self.core.config.max_pending {
                if state.pending.len() >= limit {
                    warn!(
                        queue = %self.core.config.name,
                        limit,
                        "Rejecting submission, pending list is full"
                    );
                    return Err(QueueError::queue_full(&self.core.config.name, limit));
                }
            }
            state.insert_by_priority(job.clone());
            state.record(&job, self.core.config.history_limit);
        }

        debug!(
            queue = %self.core.config.name,
            job_id = %job.id,
            job_type = %job.job_type,
            priority,
            "Submitted job"
        );

        // Admission runs as its own task so a burst of submissions is
        // ordered by priority before the first slot is taken.
        let queue = self.clone();
        tokio::spawn(async move {
            queue.dispatch().await;
        });

        Ok(job)
    }

    /// Look up a job by id, pending list first, then history.
    /// Returns `None` for ids never seen or already evicted.
    pub async fn status(&self, id: &JobId) -> Option<Job> {
        let state = self.core.state.lock().await;
        state
            .pending
            .iter()
            .find(|job| &job.id == id)
            .cloned()
            .or_else(|| state.history.get(id.as_str()).cloned())
    }

    /// Current counters. Idempotent between queue mutations.
    pub async fn stats(&self) -> QueueStats {
        let state = self.core.state.lock().await;
        QueueStats {
            name: self.core.config.name.clone(),
            queued: state.pending.len(),
            active: state.active,
            processed: state.processed,
            failed: state.failed,
        }
    }

    /// Greedy admission: start pending jobs until the concurrency cap
    /// is reached. Runs after every submission, completion, and retry
    /// re-queue.
    ///
    /// Boxed because `dispatch` and `execute` await each other; the
    /// erased return type breaks the opaque-future cycle so the spawned
    /// tasks stay provably `Send`.
    fn dispatch(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            loop {
                let job = {
                    let mut state = self.core.state.lock().await;
                    if state.active >= self.core.config.concurrency {
                        return;
                    }
                    let Some(job) = state.pending.pop_front() else {
                        return;
                    };
                    state.active += 1;
                    let job = job.start();
                    state.sync(&job);
                    job
                };

                debug!(
                    queue = %self.core.config.name,
                    job_id = %job.id,
                    attempt = job.attempts,
                    "Dispatching job"
                );

                let queue = self.clone();
                tokio::spawn(async move {
                    queue.execute(job).await;
                });
            }
        })
    }

    /// Execute one attempt of a job and apply the outcome.
    async fn execute(&self, job: Job) {
        let name = self.core.config.name.clone();
        let handler = self.core.handlers.read().await.get(&job.job_type).cloned();

        let Some(handler) = handler else {
            // Configuration error: fail permanently, no retry.
            let err = QueueError::NoHandler(job.job_type.clone());
            error!(
                queue = %name,
                job_id = %job.id,
                job_type = %job.job_type,
                "No handler registered, failing job"
            );
            let failed = job.fail(err.to_string());
            {
                let mut state = self.core.state.lock().await;
                state.sync(&failed);
                state.failed += 1;
                state.active -= 1;
            }
            self.dispatch().await;
            return;
        };

        let outcome = handler.handle(job.payload.clone(), job.clone()).await;

        match outcome {
            Ok(result) => {
                info!(
                    queue = %name,
                    job_id = %job.id,
                    attempt = job.attempts,
                    "Job completed"
                );
                let completed = job.complete(result);
                let mut state = self.core.state.lock().await;
                state.sync(&completed);
                state.processed += 1;
                state.active -= 1;
            }
            Err(e) if job.can_retry() => {
                // Linear backoff: attempt N waits retry_delay * N.
                let delay = self.core.config.retry_delay * job.attempts;
                warn!(
                    queue = %name,
                    job_id = %job.id,
                    attempt = job.attempts,
                    max_retries = job.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Job failed, scheduling retry"
                );
                let retrying = job.retrying(e.to_string());
                {
                    let mut state = self.core.state.lock().await;
                    state.sync(&retrying);
                    state.active -= 1;
                }
                let queue = self.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    queue.requeue(retrying).await;
                });
            }
            Err(e) => {
                error!(
                    queue = %name,
                    job_id = %job.id,
                    attempt = job.attempts,
                    error = %e,
                    "Job failed permanently, retry budget exhausted"
                );
                let failed = job.fail(e.to_string());
                let mut state = self.core.state.lock().await;
                state.sync(&failed);
                state.failed += 1;
                state.active -= 1;
            }
        }

        self.dispatch().await;
    }

    /// Put a retried job back into the pending list once its backoff
    /// delay has elapsed.
    ///
    /// Re-entry goes through the normal priority-sort path: among equal
    /// priorities the retried job queues behind jobs already waiting,
    /// so a job stuck in a retry loop cannot starve higher-priority
    /// work.
    async fn requeue(&self, job: Job) {
        let job = job.requeue();
        debug!(
            queue = %self.core.config.name,
            job_id = %job.id,
            attempt = job.attempts,
            "Re-queueing job after backoff"
        );
        {
            let mut state = self.core.state.lock().await;
            state.insert_by_priority(job.clone());
            state.sync(&job);
        }
        self.dispatch().await;
    }
}
