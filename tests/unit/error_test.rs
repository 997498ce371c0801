//! Tests for error types

use bulk_launch::core::{BatchId, ItemFailure, SchedulerError};

#[test]
fn test_unknown_dependency_error() {
    let err = SchedulerError::UnknownDependency {
        dependency: BatchId::new(7),
        batch: BatchId::new(4),
    };
    assert_eq!(format!("{}", err), "unknown dependency 7 for batch 4");
}

#[test]
fn test_shutdown_error() {
    let err = SchedulerError::Shutdown;
    assert_eq!(format!("{}", err), "scheduler has been shut down");
}

#[test]
fn test_timeout_error() {
    let err = SchedulerError::Timeout {
        waiting: 2,
        queued: 10,
        in_flight: 3,
    };
    assert_eq!(
        format!("{}", err),
        "barrier timed out: 2 waiting batch(es), 10 queued and 3 in-flight item(s)"
    );
}

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("worker_count must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: worker_count must be greater than 0"
    );
}

#[test]
fn test_item_failure_display() {
    let failure = ItemFailure {
        batch: BatchId::new(3),
        index: 12,
        message: "index out of range".to_string(),
    };
    assert_eq!(format!("{}", failure), "batch 3 item 12: index out of range");
}
