//! Editor configuration.
//!
//! Loaded from YAML by front ends; every field has a default so a partial
//! file (or none at all) is valid:
//!
//! ```yaml
//! worker:
//!   timeout_ms: 8000
//! history_limit: 50
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{EditorError, EditorResult};

/// Default render timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default minimum spacing between dispatches.
pub const DEFAULT_THROTTLE_MS: u64 = 100;

/// Default number of retained history checkpoints.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Worker client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// How long a dispatched request may take before it is abandoned.
    pub timeout_ms: u64,
    /// Minimum interval between two dispatches.
    pub throttle_ms: u64,
    /// Name of the worker thread.
    pub thread_name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            throttle_ms: DEFAULT_THROTTLE_MS,
            thread_name: "retouch-pipeline".into(),
        }
    }
}

impl WorkerConfig {
    /// Timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Throttle interval as a [`Duration`].
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

/// Top-level editor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Worker client settings.
    pub worker: WorkerConfig,
    /// Maximum retained checkpoints; oldest are dropped first.
    pub history_limit: usize,
    /// Run the pipeline on a worker thread. When `false`, or when the worker
    /// cannot start, renders run inline on the caller.
    pub use_worker: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            worker: WorkerConfig::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            use_worker: true,
        }
    }
}

impl EditorConfig {
    /// Checks value ranges.
    pub fn validate(&self) -> EditorResult<()> {
        if self.worker.timeout_ms == 0 {
            return Err(EditorError::config("worker.timeout_ms must be > 0"));
        }
        if self.worker.thread_name.trim().is_empty() {
            return Err(EditorError::config("worker.thread_name must not be empty"));
        }
        if self.history_limit == 0 {
            return Err(EditorError::config("history_limit must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EditorConfig::default();
        assert_eq!(cfg.worker.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.worker.throttle(), Duration::from_millis(100));
        assert!(cfg.use_worker);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let cfg: EditorConfig = serde_yaml::from_str("worker:\n  timeout_ms: 250\nuse_worker: false\n").unwrap();
        assert_eq!(cfg.worker.timeout_ms, 250);
        assert_eq!(cfg.worker.throttle_ms, DEFAULT_THROTTLE_MS);
        assert_eq!(cfg.history_limit, DEFAULT_HISTORY_LIMIT);
        assert!(!cfg.use_worker);
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut cfg = EditorConfig::default();
        cfg.worker.timeout_ms = 0;
        assert!(matches!(cfg.validate(), Err(EditorError::Config(_))));

        let mut cfg = EditorConfig::default();
        cfg.history_limit = 0;
        assert!(cfg.validate().is_err());
    }
}
