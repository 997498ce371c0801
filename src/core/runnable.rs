//! The per-item work capability executed by worker threads.

/// Work executed once per item of a bulk launch.
///
/// A single instance is shared by every item of its batch and may be invoked
/// concurrently from several worker threads with different indices. The
/// scheduler never calls it while holding its internal lock, but calling back
/// into `submit` or `drain_barrier` on the executing scheduler from inside
/// `run` is not supported and may deadlock.
///
/// Closures of the form `Fn(usize, usize)` implement this trait directly.
///
/// # Example
///
/// ```rust
/// use bulk_launch::core::BulkTask;
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// struct SumIndices {
///     total: AtomicU64,
/// }
///
/// impl BulkTask for SumIndices {
///     fn run(&self, index: usize, _count: usize) {
///         self.total.fetch_add(index as u64, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait BulkTask: Send + Sync + 'static {
    /// Execute item `index` of a launch with `count` items in total.
    fn run(&self, index: usize, count: usize);
}

impl<F> BulkTask for F
where
    F: Fn(usize, usize) + Send + Sync + 'static,
{
    fn run(&self, index: usize, count: usize) {
        self(index, count);
    }
}
