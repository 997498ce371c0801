//! Telemetry helpers for structured logging and tracing.

/// Initialize tracing for applications embedding the scheduler.
///
/// Installs a `fmt` subscriber filtered by `RUST_LOG` unless a global
/// subscriber is already set. Scheduler events use targets under `bulk_launch`,
/// e.g. `RUST_LOG=bulk_launch=debug` shows per-batch transitions.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_thread_names(true)
        .try_init();
}
