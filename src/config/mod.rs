//! Configuration models for the scheduler.

pub mod scheduler;

pub use scheduler::{SchedulerConfig, DEFAULT_STACK_SIZE, MIN_STACK_SIZE};
