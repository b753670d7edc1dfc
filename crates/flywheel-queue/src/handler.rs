//! Job handler trait.

use std::future::Future;

use async_trait::async_trait;
use flywheel_models::Job;
use serde_json::Value;

/// Outcome of one handler execution. The error is recorded on the job
/// and drives the retry path; the success value becomes `job.result`.
pub type HandlerResult = anyhow::Result<Value>;

/// Asynchronous handler for one job type.
///
/// The queue invokes `handle` with the submitted payload verbatim and a
/// read snapshot of the job (attempt counter, priority, id) for logging
/// or attempt-dependent behavior. Every error is treated as retryable
/// until the job's budget runs out; handlers that want fail-fast
/// semantics must encode it in their return value instead of erroring.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, payload: Value, job: Job) -> HandlerResult;
}

/// Adapter so plain async closures can be registered as handlers.
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F, Fut> JobHandler for FnHandler<F>
where
    F: Fn(Value, Job) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn handle(&self, payload: Value, job: Job) -> HandlerResult {
        (self.0)(payload, job).await
    }
}
