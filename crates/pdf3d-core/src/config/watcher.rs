//! Completion watcher configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Polling budget and terminal markers for the completion watcher.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Polling quantum in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    #[validate(range(min = 10, max = 60000))]
    pub poll_interval_ms: u64,
    /// Ceiling in seconds after which the job is declared timed out.
    #[serde(default = "default_timeout_seconds")]
    #[validate(range(min = 1, max = 3600))]
    pub timeout_seconds: u64,
    /// The artifact must be strictly larger than this many bytes to count
    /// as a finished export.
    #[serde(default = "default_min_artifact_bytes")]
    pub min_artifact_bytes: u64,
    /// Log substring that marks a 2D (non-exportable) source document.
    #[serde(default = "default_warning_marker")]
    #[validate(length(min = 1))]
    pub warning_marker: String,
    /// Log substring that marks a failed export.
    #[serde(default = "default_error_marker")]
    #[validate(length(min = 1))]
    pub error_marker: String,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            timeout_seconds: default_timeout_seconds(),
            min_artifact_bytes: default_min_artifact_bytes(),
            warning_marker: default_warning_marker(),
            error_marker: default_error_marker(),
        }
    }
}

impl WatcherConfig {
    /// The polling quantum.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// The polling ceiling.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_min_artifact_bytes() -> u64 {
    100
}

fn default_warning_marker() -> String {
    "WARNING".to_string()
}

fn default_error_marker() -> String {
    "ERROR".to_string()
}
