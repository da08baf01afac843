//! Job reports and the batch summary.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pdf3d_automation::{Job, Outcome, SourceKind};

use crate::error::JobFailure;
use crate::metrics::MetricsSnapshot;
use crate::state::JobState;

/// What happened to one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    /// Source file name.
    pub source: String,
    /// Source document kind.
    pub kind: SourceKind,
    /// Final state.
    pub state: JobState,
    /// Watcher outcome, when the export was triggered.
    pub outcome: Option<Outcome>,
    /// Produced document.
    pub document: Option<PathBuf>,
    /// Why no document was produced.
    pub failure: Option<JobFailure>,
    /// Wall time spent on the job.
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl JobReport {
    /// A fresh report for a queued job.
    pub fn queued(job: &Job) -> Self {
        Self {
            source: job.file_name.clone(),
            kind: job.kind,
            state: JobState::Queued,
            outcome: None,
            document: None,
            failure: None,
            duration: Duration::ZERO,
        }
    }

    /// `DONE`, `SKIPPED`, or `FAIL`.
    pub fn status(&self) -> &'static str {
        if self.document.is_some() {
            "DONE"
        } else if self.outcome == Some(Outcome::SkippedNon3d) && self.failure.is_none() {
            "SKIPPED"
        } else {
            "FAIL"
        }
    }
}

/// Everything one batch run did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Run identifier.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// One report per discovered source, in processing order.
    pub reports: Vec<JobReport>,
    /// Aggregate counters.
    pub metrics: MetricsSnapshot,
}

impl BatchSummary {
    /// Reports with a given status.
    pub fn count(&self, status: &str) -> usize {
        self.reports.iter().filter(|r| r.status() == status).count()
    }
}

/// Serialize a `Duration` as whole milliseconds.
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

/// Serialize an optional `Duration` as whole milliseconds.
pub(crate) mod opt_duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        duration: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match duration {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let millis: Option<u64> = Option::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}
