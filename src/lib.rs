//! # Bulk Launch
//!
//! An in-process, dependency-aware task scheduler for bulk launches.
//!
//! A *bulk launch* is a homogeneous batch of `N` independent work items that all
//! run the same user-supplied callback with a different item index. Clients may
//! declare that a batch must not begin until one or more previously submitted
//! batches have fully finished. The scheduler runs ready work items on a fixed
//! pool of worker threads, tracks the dependency graph between batches, promotes
//! batches to ready as soon as their last dependency completes, and offers a
//! blocking barrier that waits for all outstanding work to drain.
//!
//! ## Key Features
//!
//! - **Dependency graph**: batches may only depend on earlier batches, so the graph
//!   is acyclic by construction; unknown dependency ids are rejected at submit time
//! - **Fixed worker pool**: dedicated OS threads popping a shared FIFO of work items
//! - **Race-free completion**: a batch completes only after its *last* item finishes
//! - **Drain barrier**: blocks until every submitted batch, including waiting
//!   chains, has completed; callback panics are surfaced here
//! - **Abrupt shutdown**: stops workers and abandons queued-but-unstarted items
//!
//! ## Example
//!
//! ```rust,no_run
//! use bulk_launch::core::Scheduler;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let scheduler = Scheduler::with_threads(4)?;
//! let hits = Arc::new(AtomicUsize::new(0));
//!
//! let h = Arc::clone(&hits);
//! let a = scheduler.submit(move |_index, _count| { h.fetch_add(1, Ordering::Relaxed); }, 100, &[])?;
//!
//! let h = Arc::clone(&hits);
//! let _b = scheduler.submit(move |_index, _count| { h.fetch_add(1, Ordering::Relaxed); }, 10, &[a])?;
//!
//! scheduler.drain_barrier()?;
//! assert_eq!(hits.load(Ordering::Relaxed), 110);
//! # Ok::<(), bulk_launch::core::SchedulerError>(())
//! ```
//!
//! For complete examples, see `tests/scheduler_test.rs`.

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling: batch registry, dependency graph, worker pool and barrier.
pub mod core;
/// Configuration models for the scheduler.
pub mod config;
/// Shared utilities.
pub mod util;
