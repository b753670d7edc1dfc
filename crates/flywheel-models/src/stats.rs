//! Queue statistics reported to callers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A point-in-time snapshot of a queue's counters.
///
/// `queued` and `active` reflect the current pending list and in-flight
/// count; `processed` and `failed` are lifetime totals that keep growing
/// after jobs leave the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QueueStats {
    /// Queue label (for logging/metrics)
    pub name: String,
    /// Jobs currently in the pending list
    pub queued: usize,
    /// Jobs currently being executed
    pub active: usize,
    /// Lifetime count of completed jobs
    pub processed: u64,
    /// Lifetime count of permanently failed jobs
    pub failed: u64,
}
