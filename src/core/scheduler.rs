//! Worker pool and synchronization controller.
//!
//! The scheduler owns a `TaskGraph` behind a single `parking_lot::Mutex` and
//! binds it to a fixed set of worker threads with two condition variables:
//!
//! - `work_available`: workers sleep here while the ready queue is empty
//! - `idle`: barrier callers sleep here until nothing is queued, running or waiting
//!
//! Both waits re-check their condition after every wake. Callbacks always run
//! with the lock released, so long-running work never blocks submission or the
//! completion bookkeeping of other workers.
//!
//! # Example
//!
//! ```rust,no_run
//! use bulk_launch::config::SchedulerConfig;
//! use bulk_launch::core::Scheduler;
//!
//! let scheduler = Scheduler::new(SchedulerConfig::new().with_worker_count(8))?;
//! let a = scheduler.submit(|i, n| println!("a {i}/{n}"), 16, &[])?;
//! let b = scheduler.submit(|i, n| println!("b {i}/{n}"), 16, &[a])?;
//! scheduler.submit(|i, n| println!("c {i}/{n}"), 4, &[a, b])?;
//! scheduler.drain_barrier()?;
//! scheduler.shutdown();
//! # Ok::<(), bulk_launch::core::SchedulerError>(())
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;

use super::{BatchId, BatchState, BulkTask, ItemFailure, SchedulerError, TaskGraph, WaitingBatch};

/// Snapshot of scheduler utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Batches accepted by `submit`.
    pub submitted_batches: usize,
    /// Batches whose every item has finished.
    pub completed_batches: usize,
    /// Batches blocked on unfinished dependencies.
    pub waiting_batches: usize,
    /// Work items in the ready queue.
    pub queued_items: usize,
    /// Work items currently executing.
    pub in_flight_items: usize,
    /// Work items that finished executing, failed ones included.
    pub executed_items: u64,
    /// Work items whose callback panicked.
    pub failed_items: u64,
}

/// State shared between the scheduler handle and its workers.
struct Shared {
    graph: Mutex<TaskGraph>,
    work_available: Condvar,
    idle: Condvar,
    shutdown: AtomicBool,
}

impl Shared {
    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Wake whoever can make progress after the graph changed.
    fn signal(&self, graph: &TaskGraph, enqueued: usize) {
        match enqueued {
            0 => {}
            1 => {
                self.work_available.notify_one();
            }
            _ => {
                self.work_available.notify_all();
            }
        }
        if graph.is_idle() {
            self.idle.notify_all();
        }
    }

    /// Block until idle, optionally bounded by `deadline`.
    fn drain(&self, deadline: Option<Instant>) -> Result<(), SchedulerError> {
        let mut graph = self.graph.lock();
        while !graph.is_idle() {
            if self.is_shutdown() {
                return Err(SchedulerError::Shutdown);
            }
            match deadline {
                None => self.idle.wait(&mut graph),
                Some(deadline) => {
                    if self.idle.wait_until(&mut graph, deadline).timed_out() && !graph.is_idle() {
                        let waiting = graph.waiting_report();
                        warn!(
                            waiting = waiting.len(),
                            queued = graph.queued(),
                            in_flight = graph.in_flight(),
                            report = ?waiting,
                            "Barrier timed out before the scheduler became idle"
                        );
                        return Err(SchedulerError::Timeout {
                            waiting: waiting.len(),
                            queued: graph.queued(),
                            in_flight: graph.in_flight(),
                        });
                    }
                }
            }
        }

        let failures = graph.take_failures();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(SchedulerError::ItemsFailed(failures))
        }
    }
}

/// Dependency-aware bulk launch scheduler backed by dedicated OS threads.
///
/// Workers are started by [`Scheduler::new`] and joined by
/// [`Scheduler::shutdown`] or on drop. Shutdown is abrupt: items still in the
/// ready queue are abandoned, so call [`Scheduler::drain_barrier`] first when
/// completion matters.
pub struct Scheduler {
    config: SchedulerConfig,
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    /// Create a scheduler and start `config.worker_count` worker threads.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::InvalidConfig` if the configuration is invalid
    /// - `SchedulerError::WorkerSpawn` if a worker thread cannot be started
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;

        let shared = Arc::new(Shared {
            graph: Mutex::new(TaskGraph::new()),
            work_available: Condvar::new(),
            idle: Condvar::new(),
            shutdown: AtomicBool::new(false),
        });

        let scheduler = Self {
            config,
            shared,
            workers: Mutex::new(Vec::new()),
        };

        {
            let mut workers = scheduler.workers.lock();
            for worker_id in 0..scheduler.config.worker_count {
                // On failure, dropping `scheduler` joins the workers already started.
                let worker = spawn_worker(worker_id, Arc::clone(&scheduler.shared), &scheduler.config)?;
                workers.push(worker);
            }
        }

        info!(
            worker_count = scheduler.config.worker_count,
            "Scheduler started"
        );
        Ok(scheduler)
    }

    /// Create a scheduler with `thread_count` workers and default settings.
    ///
    /// # Errors
    ///
    /// Same as [`Scheduler::new`]; a `thread_count` of zero is rejected.
    pub fn with_threads(thread_count: usize) -> Result<Self, SchedulerError> {
        Self::new(SchedulerConfig::new().with_worker_count(thread_count))
    }

    /// Submit a bulk launch of `item_count` items, each running `work(index, item_count)`.
    ///
    /// None of the items starts before every item of every batch in `deps`
    /// has finished. Returns immediately with the new batch id.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::UnknownDependency` if `deps` names an id never issued
    /// - `SchedulerError::Shutdown` if the scheduler has been shut down
    pub fn submit<F>(&self, work: F, item_count: usize, deps: &[BatchId]) -> Result<BatchId, SchedulerError>
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.submit_shared(Arc::new(work), item_count, deps)
    }

    /// Submit a bulk launch driven by a [`BulkTask`] implementation.
    ///
    /// # Errors
    ///
    /// Same as [`Scheduler::submit`].
    pub fn submit_task<T>(&self, task: T, item_count: usize, deps: &[BatchId]) -> Result<BatchId, SchedulerError>
    where
        T: BulkTask,
    {
        self.submit_shared(Arc::new(task), item_count, deps)
    }

    /// Submit a bulk launch whose callback is shared with other launches.
    ///
    /// # Errors
    ///
    /// Same as [`Scheduler::submit`].
    pub fn submit_shared(
        &self,
        task: Arc<dyn BulkTask>,
        item_count: usize,
        deps: &[BatchId],
    ) -> Result<BatchId, SchedulerError> {
        if self.shared.is_shutdown() {
            return Err(SchedulerError::Shutdown);
        }

        let mut graph = self.shared.graph.lock();
        let registration = graph.register(task, item_count, deps)?;
        debug!(
            batch = %registration.id,
            item_count,
            deps = deps.len(),
            state = ?registration.state,
            "Batch submitted"
        );
        self.shared.signal(&graph, registration.enqueued);
        Ok(registration.id)
    }

    /// Block until every submitted batch has completed.
    ///
    /// Batches still waiting on dependencies count as outstanding, so this only
    /// returns once the whole graph has drained. There is no timeout; a graph
    /// that can never drain blocks forever (see [`Scheduler::waiting_report`]
    /// and [`Scheduler::drain_barrier_timeout`]).
    ///
    /// # Errors
    ///
    /// - `SchedulerError::ItemsFailed` if any callback panicked since the last
    ///   barrier; the failures are reported once
    /// - `SchedulerError::Shutdown` if the scheduler shut down with work left
    pub fn drain_barrier(&self) -> Result<(), SchedulerError> {
        self.shared.drain(None)
    }

    /// Like [`Scheduler::drain_barrier`], but gives up after `timeout`.
    ///
    /// A timeout too large to represent as a deadline waits without bound.
    ///
    /// # Errors
    ///
    /// `SchedulerError::Timeout` when the deadline passes first, plus every
    /// error of [`Scheduler::drain_barrier`].
    pub fn drain_barrier_timeout(&self, timeout: Duration) -> Result<(), SchedulerError> {
        self.shared.drain(Instant::now().checked_add(timeout))
    }

    /// Await the drain barrier from an async context.
    ///
    /// The blocking wait moves onto tokio's blocking thread pool.
    ///
    /// # Errors
    ///
    /// Same as [`Scheduler::drain_barrier`], plus `SchedulerError::Internal`
    /// if the blocking task could not complete.
    #[cfg(feature = "tokio-runtime")]
    pub async fn drain_async(&self) -> Result<(), SchedulerError> {
        let shared = Arc::clone(&self.shared);
        tokio::task::spawn_blocking(move || shared.drain(None))
            .await
            .map_err(|e| SchedulerError::Internal(format!("barrier task failed: {e}")))?
    }

    /// Current state of a batch, or `None` for an id never issued.
    #[must_use]
    pub fn batch_state(&self, id: BatchId) -> Option<BatchState> {
        self.shared.graph.lock().state(id)
    }

    /// Whether every item of `id` has finished.
    #[must_use]
    pub fn is_complete(&self, id: BatchId) -> bool {
        self.batch_state(id) == Some(BatchState::Complete)
    }

    /// Diagnostic dump of batches blocked on unfinished dependencies.
    #[must_use]
    pub fn waiting_report(&self) -> Vec<WaitingBatch> {
        self.shared.graph.lock().waiting_report()
    }

    /// Get current scheduler statistics.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        let graph = self.shared.graph.lock();
        SchedulerStats {
            worker_count: self.config.worker_count,
            submitted_batches: graph.submitted(),
            completed_batches: graph.completed(),
            waiting_batches: graph.waiting(),
            queued_items: graph.queued(),
            in_flight_items: graph.in_flight(),
            executed_items: graph.executed(),
            failed_items: graph.failed(),
        }
    }

    /// Whether [`Scheduler::shutdown`] has been requested.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shared.is_shutdown()
    }

    /// Configuration the scheduler was built with.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Stop all workers and join them.
    ///
    /// Items already executing finish; items still queued are abandoned.
    /// Later calls to `submit` fail with `SchedulerError::Shutdown`. Calling
    /// this more than once is harmless.
    pub fn shutdown(&self) {
        if self.shared.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        let abandoned = {
            // Notify under the lock so no worker misses the flag between its
            // check and its wait.
            let graph = self.shared.graph.lock();
            self.shared.work_available.notify_all();
            self.shared.idle.notify_all();
            graph.queued()
        };
        info!(abandoned_items = abandoned, "Shutting down scheduler");

        let current = thread::current().id();
        let mut workers = self.workers.lock();
        let worker_count = workers.len();
        for (idx, worker) in workers.drain(..).enumerate() {
            if worker.thread().id() == current {
                // Dropped from inside a callback; this thread exits on its own.
                continue;
            }
            if worker.join().is_err() {
                warn!(worker_id = idx, "Worker panicked");
            } else {
                debug!(worker_id = idx, "Worker joined successfully");
            }
        }

        info!(worker_count, "Scheduler shut down complete");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawn a worker thread.
fn spawn_worker(
    worker_id: usize,
    shared: Arc<Shared>,
    config: &SchedulerConfig,
) -> Result<JoinHandle<()>, SchedulerError> {
    thread::Builder::new()
        .name(format!("{}-{worker_id}", config.thread_name_prefix))
        .stack_size(config.thread_stack_size)
        .spawn(move || worker_loop(worker_id, &shared))
        .map_err(|e| SchedulerError::WorkerSpawn(e.to_string()))
}

/// Pop, run outside the lock, report completion; sleep while the queue is empty.
fn worker_loop(worker_id: usize, shared: &Shared) {
    debug!(worker_id, "Worker thread started");

    let mut graph = shared.graph.lock();
    loop {
        if shared.is_shutdown() {
            break;
        }
        let Some(item) = graph.pop_ready() else {
            shared.work_available.wait(&mut graph);
            continue;
        };

        let batch = item.batch;
        let index = item.index;
        // `item` moves into the closure so the callback handle is released
        // before the lock is taken again.
        let outcome = MutexGuard::unlocked(&mut graph, move || {
            panic::catch_unwind(AssertUnwindSafe(|| item.run()))
        });

        let failure = outcome.err().map(|payload| {
            let message = panic_message(payload.as_ref());
            warn!(worker_id, batch = %batch, index, error = %message, "Work item panicked");
            ItemFailure { batch, index, message }
        });

        let enqueued = graph.finish_item(batch, failure);
        shared.signal(&graph, enqueued);
    }
    drop(graph);

    debug!(worker_id, "Worker thread exiting");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "callback panicked".to_string())
}
