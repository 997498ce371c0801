//! Batch registry, dependency graph, ready queue and waiting set.
//!
//! `TaskGraph` is a plain single-threaded state machine. The scheduler keeps it
//! behind one mutex and is responsible for all locking and signalling; every
//! method here assumes exclusive access.
//!
//! # State machine
//!
//! ```text
//!   submit ──► Waiting ──(last dependency completes)──► Ready ──(last item finishes)──► Complete
//!     └─────────────(no pending dependencies)─────────────┘
//! ```
//!
//! Batches live in an append-only arena indexed by id. Reverse edges map a
//! prerequisite to the batches waiting on it and are consumed when the
//! prerequisite completes.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use tracing::debug;

use super::batch::BatchRecord;
use super::{BatchId, BatchState, BulkTask, ItemFailure, SchedulerError, WaitingBatch, WorkItem};

/// Outcome of registering a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// Id assigned to the new batch.
    pub id: BatchId,
    /// Initial state of the batch.
    pub state: BatchState,
    /// Work items pushed onto the ready queue.
    pub enqueued: usize,
}

/// Shared control-plane state of the scheduler.
#[derive(Default)]
pub struct TaskGraph {
    /// Registry arena; slot `i` holds batch id `i + 1`.
    batches: Vec<BatchRecord>,
    /// Reverse edges: prerequisite -> dependents still waiting on it.
    dependents: HashMap<BatchId, Vec<BatchId>>,
    ready: VecDeque<WorkItem>,
    waiting: BTreeSet<BatchId>,
    in_flight: usize,
    completed_batches: usize,
    executed_items: u64,
    failed_items: u64,
    failures: Vec<ItemFailure>,
}

impl TaskGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next registered batch will receive.
    #[must_use]
    pub fn next_id(&self) -> BatchId {
        BatchId::new(self.batches.len() as u64 + 1)
    }

    /// Register a new batch.
    ///
    /// Dependencies are validated before an id is allocated, so a rejected
    /// submission consumes nothing. Dependencies that have already completed
    /// are satisfied immediately and add no edge.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::UnknownDependency` if any dependency id was
    /// never issued.
    pub fn register(
        &mut self,
        task: Arc<dyn BulkTask>,
        item_count: usize,
        deps: &[BatchId],
    ) -> Result<Registration, SchedulerError> {
        let id = self.next_id();
        if let Some(&dependency) = deps.iter().find(|dep| dep.get() == 0 || **dep >= id) {
            return Err(SchedulerError::UnknownDependency { dependency, batch: id });
        }

        let mut unique = deps.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let mut pending = 0;
        for dep in unique {
            if self.batches[dep.slot()].state != BatchState::Complete {
                self.dependents.entry(dep).or_default().push(id);
                pending += 1;
            }
        }

        self.batches.push(BatchRecord {
            item_count,
            outstanding: item_count,
            pending_dependencies: pending,
            state: BatchState::Waiting,
            task: Some(task),
        });

        if pending > 0 {
            self.waiting.insert(id);
            debug!(batch = %id, pending, item_count, "Batch waiting on dependencies");
            return Ok(Registration { id, state: BatchState::Waiting, enqueued: 0 });
        }

        let enqueued = self.promote(id);
        let state = self.batches[id.slot()].state;
        Ok(Registration { id, state, enqueued })
    }

    /// Pop the next ready item and count it as in flight.
    pub fn pop_ready(&mut self) -> Option<WorkItem> {
        let item = self.ready.pop_front()?;
        self.in_flight += 1;
        Some(item)
    }

    /// Record that one in-flight item of `batch` has finished executing.
    ///
    /// The batch completes only when this was its last outstanding item, at
    /// which point completion propagates to its dependents. Returns the number
    /// of items newly pushed onto the ready queue.
    pub fn finish_item(&mut self, batch: BatchId, failure: Option<ItemFailure>) -> usize {
        self.in_flight -= 1;
        self.executed_items += 1;
        if let Some(failure) = failure {
            self.failed_items += 1;
            self.failures.push(failure);
        }

        let record = &mut self.batches[batch.slot()];
        record.outstanding -= 1;
        if record.outstanding > 0 {
            return 0;
        }
        self.complete(batch)
    }

    /// Move a batch with no pending dependencies into the ready queue.
    ///
    /// A batch without items has nothing to run and completes on the spot.
    fn promote(&mut self, id: BatchId) -> usize {
        let record = &mut self.batches[id.slot()];
        record.state = BatchState::Ready;
        let Some(task) = record.task.take() else {
            return 0;
        };
        let count = record.item_count;
        if count == 0 {
            return self.complete(id);
        }

        self.ready.extend((0..count).map(|index| WorkItem {
            batch: id,
            index,
            count,
            task: Arc::clone(&task),
        }));
        debug!(batch = %id, items = count, "Batch ready");
        count
    }

    /// Mark a batch complete and release its dependents.
    fn complete(&mut self, id: BatchId) -> usize {
        let mut enqueued = 0;
        let mut finished = vec![id];

        while let Some(done) = finished.pop() {
            self.batches[done.slot()].state = BatchState::Complete;
            self.completed_batches += 1;
            debug!(batch = %done, "Batch complete");

            for dependent in self.dependents.remove(&done).unwrap_or_default() {
                let record = &mut self.batches[dependent.slot()];
                record.pending_dependencies -= 1;
                if record.pending_dependencies > 0 {
                    continue;
                }
                self.waiting.remove(&dependent);
                let record = &mut self.batches[dependent.slot()];
                record.state = BatchState::Ready;
                if record.item_count == 0 {
                    // Nothing to execute; completes in this same pass.
                    record.task = None;
                    finished.push(dependent);
                } else {
                    enqueued += self.promote(dependent);
                }
            }
        }
        enqueued
    }

    /// No queued item, no item in flight and no waiting batch.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.ready.is_empty() && self.in_flight == 0 && self.waiting.is_empty()
    }

    /// Current state of a batch, or `None` if the id was never issued.
    #[must_use]
    pub fn state(&self, id: BatchId) -> Option<BatchState> {
        if id.get() == 0 {
            return None;
        }
        self.batches.get(id.slot()).map(|record| record.state)
    }

    /// Snapshot of the waiting set in id order.
    #[must_use]
    pub fn waiting_report(&self) -> Vec<WaitingBatch> {
        self.waiting
            .iter()
            .map(|&id| {
                let record = &self.batches[id.slot()];
                WaitingBatch {
                    id,
                    pending_dependencies: record.pending_dependencies,
                    item_count: record.item_count,
                }
            })
            .collect()
    }

    /// Drain the callback failures recorded since the last call.
    pub fn take_failures(&mut self) -> Vec<ItemFailure> {
        std::mem::take(&mut self.failures)
    }

    /// Batches registered so far.
    #[must_use]
    pub fn submitted(&self) -> usize {
        self.batches.len()
    }

    /// Batches that reached the complete state.
    #[must_use]
    pub const fn completed(&self) -> usize {
        self.completed_batches
    }

    /// Batches in the waiting set.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.waiting.len()
    }

    /// Items in the ready queue.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.ready.len()
    }

    /// Items popped but not yet finished.
    #[must_use]
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Items that finished executing, including failed ones.
    #[must_use]
    pub const fn executed(&self) -> u64 {
        self.executed_items
    }

    /// Items whose callback panicked.
    #[must_use]
    pub const fn failed(&self) -> u64 {
        self.failed_items
    }
}
