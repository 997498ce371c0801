//! Scheduler configuration.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Default worker thread stack size (2 MiB).
pub const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;
/// Smallest accepted worker thread stack size (64 KiB).
pub const MIN_STACK_SIZE: usize = 64 * 1024;

const ENV_WORKERS: &str = "BULK_LAUNCH_WORKERS";
const ENV_THREAD_PREFIX: &str = "BULK_LAUNCH_THREAD_PREFIX";
const ENV_STACK_SIZE: &str = "BULK_LAUNCH_STACK_SIZE";

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of worker threads started at construction.
    pub worker_count: usize,
    /// Worker threads are named `{prefix}-{index}`.
    pub thread_name_prefix: String,
    /// Stack size of each worker thread in bytes.
    pub thread_stack_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            thread_name_prefix: "bl-worker".into(),
            thread_stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl SchedulerConfig {
    /// Configuration with one worker per logical CPU.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the worker thread stack size in bytes.
    #[must_use]
    pub fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = bytes;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.thread_stack_size < MIN_STACK_SIZE {
            return Err(format!("thread_stack_size must be at least {MIN_STACK_SIZE} bytes"));
        }
        if self.thread_name_prefix.trim().is_empty() {
            return Err("thread_name_prefix must not be empty".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, parsed or validated.
    pub fn from_json_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading scheduler config {}", path.display()))?;
        Self::from_json_str(&raw).map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))
    }

    /// Build configuration from the process environment.
    ///
    /// A `.env` file is loaded first if present. Recognized variables are
    /// `BULK_LAUNCH_WORKERS`, `BULK_LAUNCH_THREAD_PREFIX` and
    /// `BULK_LAUNCH_STACK_SIZE`; unset ones keep their defaults.
    ///
    /// # Errors
    ///
    /// Fails if a variable is not a valid number or the result is invalid.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(ENV_WORKERS) {
            cfg.worker_count = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_WORKERS}={raw:?} is not a valid count"))?;
        }
        if let Some(prefix) = lookup(ENV_THREAD_PREFIX) {
            cfg.thread_name_prefix = prefix;
        }
        if let Some(raw) = lookup(ENV_STACK_SIZE) {
            cfg.thread_stack_size = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_STACK_SIZE}={raw:?} is not a valid size"))?;
        }
        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_overrides_defaults() {
        let cfg = SchedulerConfig::from_lookup(lookup(&[
            (ENV_WORKERS, "3"),
            (ENV_THREAD_PREFIX, "render"),
        ]))
        .unwrap();
        assert_eq!(cfg.worker_count, 3);
        assert_eq!(cfg.thread_name_prefix, "render");
        assert_eq!(cfg.thread_stack_size, DEFAULT_STACK_SIZE);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        assert!(SchedulerConfig::from_lookup(lookup(&[(ENV_WORKERS, "many")])).is_err());
        assert!(SchedulerConfig::from_lookup(lookup(&[(ENV_WORKERS, "0")])).is_err());
        assert!(SchedulerConfig::from_lookup(lookup(&[(ENV_STACK_SIZE, "1024")])).is_err());
    }

    #[test]
    fn test_from_lookup_empty_uses_defaults() {
        let cfg = SchedulerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg, SchedulerConfig::default());
    }
}
