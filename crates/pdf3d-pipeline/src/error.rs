//! Job-level failure taxonomy.
//!
//! Every fault inside a job is converted into a [`JobFailure`] at the job
//! boundary and recorded in the job's report; none escapes the batch loop.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pdf3d_automation::AutomationError;
use pdf3d_document::DocumentError;
use pdf3d_mesh::MeshError;

/// Why a job ended without a document.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum JobFailure {
    /// The processor document is absent.
    #[error("Processor document missing: {}", .0.display())]
    MissingDependency(PathBuf),

    /// Attaching to, driving, or opening a document in the CAD application
    /// failed.
    #[error("CAD application fault: {0}")]
    ExternalAppFault(String),

    /// No terminal signal before the polling ceiling.
    #[error("No export signal within {0} ms")]
    TimeoutExceeded(u64),

    /// The worker log carried the error marker.
    #[error("Export reported an error: {0}")]
    WorkerReportedError(String),

    /// The artifact could not be loaded or normalized.
    #[error("Mesh processing failed: {0}")]
    MeshLoadFailure(String),

    /// The normalized mesh could not be encoded into the asset format.
    #[error("Asset encoding failed: {0}")]
    AssetEncodingFailure(String),

    /// The compiler produced no document.
    #[error("Document compilation failed: {0}")]
    CompileFailure(String),

    /// Moving or writing an intermediate file failed.
    #[error("File handling failed: {0}")]
    Io(String),
}

impl JobFailure {
    /// Short stable code for summaries.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingDependency(_) => "MISSING_DEPENDENCY",
            Self::ExternalAppFault(_) => "EXTERNAL_APP_FAULT",
            Self::TimeoutExceeded(_) => "TIMEOUT_EXCEEDED",
            Self::WorkerReportedError(_) => "WORKER_REPORTED_ERROR",
            Self::MeshLoadFailure(_) => "MESH_LOAD_FAILURE",
            Self::AssetEncodingFailure(_) => "ASSET_ENCODING_FAILURE",
            Self::CompileFailure(_) => "COMPILE_FAILURE",
            Self::Io(_) => "IO",
        }
    }
}

impl From<AutomationError> for JobFailure {
    fn from(err: AutomationError) -> Self {
        match err {
            AutomationError::ProcessorMissing { path } => Self::MissingDependency(path),
            other if other.is_application_fault() => Self::ExternalAppFault(other.to_string()),
            AutomationError::Io(e) => Self::Io(e.to_string()),
            other => Self::Io(other.to_string()),
        }
    }
}

impl From<MeshError> for JobFailure {
    fn from(err: MeshError) -> Self {
        if err.is_encoding() {
            Self::AssetEncodingFailure(err.to_string())
        } else {
            Self::MeshLoadFailure(err.to_string())
        }
    }
}

impl From<DocumentError> for JobFailure {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Io(e) => Self::Io(e.to_string()),
            e @ DocumentError::AssetMissing(_) => Self::AssetEncodingFailure(e.to_string()),
            other => Self::CompileFailure(other.to_string()),
        }
    }
}

impl From<std::io::Error> for JobFailure {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
