//! Per-job state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

use pdf3d_automation::Outcome;

/// Where a job is in its lifecycle.
///
/// `Queued → Triggered → Observed(outcome)`, then for `SUCCESS` only
/// `→ Normalized → Assembled`. Any state may move to `Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "outcome", rename_all = "snake_case")]
pub enum JobState {
    /// Waiting in the batch queue.
    Queued,
    /// Handed to the CAD application.
    Triggered,
    /// The watcher observed a terminal outcome.
    Observed(Outcome),
    /// The mesh was normalized and serialized.
    Normalized,
    /// The document was produced.
    Assembled,
    /// The job ended without a document after a fault.
    Aborted,
}

impl JobState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition(self, next: JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (Assembled, _) | (Aborted, _) => false,
            (_, Aborted) => true,
            (Queued, Triggered) => true,
            (Triggered, Observed(_)) => true,
            (Observed(Outcome::Success), Normalized) => true,
            (Normalized, Assembled) => true,
            _ => false,
        }
    }

    /// Whether the job can make no further progress.
    pub fn is_terminal(self) -> bool {
        match self {
            JobState::Assembled | JobState::Aborted => true,
            JobState::Observed(outcome) => outcome != Outcome::Success,
            _ => false,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "QUEUED"),
            Self::Triggered => write!(f, "TRIGGERED"),
            Self::Observed(outcome) => write!(f, "{outcome}"),
            Self::Normalized => write!(f, "NORMALIZED"),
            Self::Assembled => write!(f, "ASSEMBLED"),
            Self::Aborted => write!(f, "ABORTED"),
        }
    }
}
