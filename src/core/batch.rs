//! Batch identifiers, work items and per-batch bookkeeping records.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::BulkTask;

/// Identifier of a bulk launch.
///
/// Ids are assigned at submit time, start at 1 and strictly increase. A batch
/// may only depend on ids smaller than its own, which keeps the graph acyclic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(u64);

impl BatchId {
    /// Wrap a raw id value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Position of this batch in the registry arena.
    pub(crate) const fn slot(self) -> usize {
        // Ids start at 1; the arena is dense from 0.
        (self.0 - 1) as usize
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a batch. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    /// At least one dependency has not completed.
    Waiting,
    /// All items are queued or executing.
    Ready,
    /// Every item has finished executing.
    Complete,
}

/// A single `(batch, index, count)` unit of execution sitting in the ready queue.
#[derive(Clone)]
pub struct WorkItem {
    /// Batch this item belongs to.
    pub batch: BatchId,
    /// Index within the batch, in `0..count`.
    pub index: usize,
    /// Total number of items in the batch.
    pub count: usize,
    pub(crate) task: Arc<dyn BulkTask>,
}

impl WorkItem {
    /// Invoke the batch callback for this item.
    pub(crate) fn run(&self) {
        self.task.run(self.index, self.count);
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("batch", &self.batch)
            .field("index", &self.index)
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

/// Diagnostic view of a batch stuck in the waiting set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingBatch {
    /// Batch id.
    pub id: BatchId,
    /// Dependencies that have not yet completed.
    pub pending_dependencies: usize,
    /// Items the batch will enqueue once promoted.
    pub item_count: usize,
}

/// Registry entry for one submitted batch.
pub(crate) struct BatchRecord {
    pub item_count: usize,
    /// Items not yet finished executing. Reaches zero exactly once.
    pub outstanding: usize,
    pub pending_dependencies: usize,
    pub state: BatchState,
    /// Held only while waiting; handed to the work items on promotion.
    pub task: Option<Arc<dyn BulkTask>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_id_ordering_and_slot() {
        let a = BatchId::new(1);
        let b = BatchId::new(2);
        assert!(a < b);
        assert_eq!(a.slot(), 0);
        assert_eq!(b.slot(), 1);
        assert_eq!(b.to_string(), "2");
    }

    #[test]
    fn test_batch_state_serde() {
        let json = serde_json::to_string(&BatchState::Waiting).unwrap();
        assert_eq!(json, "\"waiting\"");
    }
}
