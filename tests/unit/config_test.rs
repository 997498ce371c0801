//! Tests for configuration validation

use bulk_launch::config::{SchedulerConfig, DEFAULT_STACK_SIZE, MIN_STACK_SIZE};

#[test]
fn test_scheduler_config_defaults() {
    let config = SchedulerConfig::new();
    assert!(config.worker_count > 0);
    assert_eq!(config.thread_stack_size, DEFAULT_STACK_SIZE);
    assert!(config.validate().is_ok());
}

#[test]
fn test_scheduler_config_builder() {
    let config = SchedulerConfig::new()
        .with_worker_count(6)
        .with_thread_name_prefix("physics")
        .with_thread_stack_size(MIN_STACK_SIZE);
    assert_eq!(config.worker_count, 6);
    assert_eq!(config.thread_name_prefix, "physics");
    assert_eq!(config.thread_stack_size, MIN_STACK_SIZE);
    assert!(config.validate().is_ok());
}

#[test]
fn test_scheduler_config_invalid_worker_count() {
    let invalid = SchedulerConfig::new().with_worker_count(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_stack_size() {
    let invalid = SchedulerConfig::new().with_thread_stack_size(MIN_STACK_SIZE - 1);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_prefix() {
    let invalid = SchedulerConfig::new().with_thread_name_prefix("  ");
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_from_json() {
    let json = r#"{
        "worker_count": 4,
        "thread_name_prefix": "bulk",
        "thread_stack_size": 1048576
    }"#;

    let config = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(config.worker_count, 4);
    assert_eq!(config.thread_name_prefix, "bulk");
    assert_eq!(config.thread_stack_size, 1_048_576);
}

#[test]
fn test_scheduler_config_from_partial_json() {
    let config = SchedulerConfig::from_json_str(r#"{ "worker_count": 2 }"#).unwrap();
    assert_eq!(config.worker_count, 2);
    assert_eq!(config.thread_stack_size, DEFAULT_STACK_SIZE);
}

#[test]
fn test_scheduler_config_from_json_rejects_invalid() {
    assert!(SchedulerConfig::from_json_str(r#"{ "worker_count": 0 }"#).is_err());
    assert!(SchedulerConfig::from_json_str("not json").is_err());
}

#[test]
fn test_scheduler_config_from_missing_file() {
    assert!(SchedulerConfig::from_json_file("/nonexistent/bulk_launch.json").is_err());
}
