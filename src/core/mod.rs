//! Core scheduling abstractions: batches, the dependency graph and the worker pool.

pub mod batch;
pub mod error;
pub mod graph;
pub mod runnable;
pub mod scheduler;

pub use batch::{BatchId, BatchState, WaitingBatch, WorkItem};
pub use error::{AppResult, ItemFailure, SchedulerError};
pub use graph::TaskGraph;
pub use runnable::BulkTask;
pub use scheduler::{Scheduler, SchedulerStats};
