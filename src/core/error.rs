//! Error types for scheduler operations.

use std::fmt;

use thiserror::Error;

use super::BatchId;

/// A single work item whose callback panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// Batch the item belongs to.
    pub batch: BatchId,
    /// Index of the item within its batch.
    pub index: usize,
    /// Panic payload rendered as text.
    pub message: String,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch {} item {}: {}", self.batch, self.index, self.message)
    }
}

/// Errors produced by the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A submitted batch named a dependency id that was never issued.
    #[error("unknown dependency {dependency} for batch {batch}")]
    UnknownDependency {
        /// The offending dependency id.
        dependency: BatchId,
        /// The id the rejected batch would have received.
        batch: BatchId,
    },
    /// One or more callbacks panicked since the last barrier.
    #[error("{} work item(s) failed, first: {}", .0.len(), first_failure(.0))]
    ItemsFailed(Vec<ItemFailure>),
    /// The scheduler has been shut down.
    #[error("scheduler has been shut down")]
    Shutdown,
    /// A bounded barrier elapsed before the system became idle.
    #[error("barrier timed out: {waiting} waiting batch(es), {queued} queued and {in_flight} in-flight item(s)")]
    Timeout {
        /// Batches still in the waiting set.
        waiting: usize,
        /// Items still in the ready queue.
        queued: usize,
        /// Items currently executing.
        in_flight: usize,
    },
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(String),
    /// Internal error (barrier task panicked, runtime shutting down, etc.).
    #[error("internal error: {0}")]
    Internal(String),
}

fn first_failure(failures: &[ItemFailure]) -> String {
    failures
        .first()
        .map_or_else(|| "none".to_string(), ToString::to_string)
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
