//! Completion watcher: polls for the terminal signals of a triggered export.
//!
//! The CAD application offers no completion callback. The only observable
//! signals are the exported artifact (present and larger than a threshold)
//! and the worker log (containing a warning or error marker). The log may be
//! mid-write while it is read, so read failures count as "not yet terminal".

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, trace};

use pdf3d_core::Layout;
use pdf3d_core::config::watcher::WatcherConfig;

/// Terminal classification of a job's trigger phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// The artifact appeared with a plausible size.
    Success,
    /// The worker log reported an error.
    Error,
    /// The worker log reported a 2D document that has no solid to export.
    #[serde(rename = "SKIPPED_NON_3D")]
    SkippedNon3d,
    /// No terminal signal within the ceiling.
    Timeout,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Error => write!(f, "ERROR"),
            Self::SkippedNon3d => write!(f, "SKIPPED_NON_3D"),
            Self::Timeout => write!(f, "TIMEOUT"),
        }
    }
}

/// A terminal signal seen on a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// The outcome the signal implies.
    pub outcome: Outcome,
    /// Worker log content, when the log decided the outcome.
    pub log: Option<String>,
}

/// The final, never re-evaluated result of watching one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Terminal outcome.
    pub outcome: Outcome,
    /// Worker log content, when the log decided the outcome.
    pub log: Option<String>,
    /// Number of polls performed.
    pub polls: u32,
    /// Wall time spent watching.
    pub elapsed: Duration,
}

/// Read access to the two well-known signal files.
pub trait SignalProbe: Send + Sync {
    /// Size of the artifact in bytes, or `None` when it does not exist.
    fn artifact_size(&self) -> Option<u64>;

    /// Content of the worker log, or `None` when it does not exist.
    fn read_log(&self) -> std::io::Result<Option<String>>;
}

/// Probe backed by the real artifact and log paths.
#[derive(Debug, Clone)]
pub struct FsProbe {
    artifact: PathBuf,
    log: PathBuf,
}

impl FsProbe {
    /// Create a probe for explicit paths.
    pub fn new(artifact: PathBuf, log: PathBuf) -> Self {
        Self { artifact, log }
    }

    /// Create a probe for the layout's shared artifact and log.
    pub fn for_layout(layout: &Layout) -> Self {
        Self::new(layout.artifact_file.clone(), layout.log_file.clone())
    }
}

impl SignalProbe for FsProbe {
    fn artifact_size(&self) -> Option<u64> {
        std::fs::metadata(&self.artifact)
            .ok()
            .filter(|m| m.is_file())
            .map(|m| m.len())
    }

    fn read_log(&self) -> std::io::Result<Option<String>> {
        match std::fs::read(&self.log) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Polls a [`SignalProbe`] once per quantum until a terminal signal or the
/// ceiling.
#[derive(Debug, Clone)]
pub struct CompletionWatcher {
    interval: Duration,
    timeout: Duration,
    min_artifact_bytes: u64,
    warning_marker: String,
    error_marker: String,
}

impl CompletionWatcher {
    /// Create a watcher from configuration.
    pub fn new(config: &WatcherConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            timeout: config.timeout(),
            min_artifact_bytes: config.min_artifact_bytes,
            warning_marker: config.warning_marker.clone(),
            error_marker: config.error_marker.clone(),
        }
    }

    /// Number of polls that fit in the ceiling (at least one).
    pub fn max_polls(&self) -> u32 {
        let interval = self.interval.as_millis().max(1);
        let polls = self.timeout.as_millis().div_ceil(interval);
        u32::try_from(polls).unwrap_or(u32::MAX).max(1)
    }

    /// Check the probe once.
    ///
    /// Precedence: artifact over warning over error.
    pub fn classify<P: SignalProbe + ?Sized>(&self, probe: &P) -> Option<Classification> {
        if let Some(size) = probe.artifact_size() {
            if size > self.min_artifact_bytes {
                return Some(Classification {
                    outcome: Outcome::Success,
                    log: None,
                });
            }
            trace!(size, threshold = self.min_artifact_bytes, "Artifact below size threshold");
        }

        let content = match probe.read_log() {
            Ok(Some(content)) => content,
            Ok(None) => return None,
            Err(e) => {
                debug!(error = %e, "Worker log not readable yet");
                return None;
            }
        };

        if content.contains(&self.warning_marker) {
            Some(Classification {
                outcome: Outcome::SkippedNon3d,
                log: Some(content.trim().to_string()),
            })
        } else if content.contains(&self.error_marker) {
            Some(Classification {
                outcome: Outcome::Error,
                log: Some(content.trim().to_string()),
            })
        } else {
            None
        }
    }

    /// Poll until a terminal signal is observed or the ceiling elapses.
    pub async fn wait<P: SignalProbe + ?Sized>(&self, probe: &P) -> Observation {
        let start = Instant::now();
        let max_polls = self.max_polls();

        for poll in 1..=max_polls {
            if let Some(found) = self.classify(probe) {
                debug!(poll, outcome = %found.outcome, "Terminal signal observed");
                return Observation {
                    outcome: found.outcome,
                    log: found.log,
                    polls: poll,
                    elapsed: start.elapsed(),
                };
            }
            tokio::time::sleep(self.interval).await;
        }

        Observation {
            outcome: Outcome::Timeout,
            log: None,
            polls: max_polls,
            elapsed: start.elapsed(),
        }
    }
}
