//! Error types for mesh loading, normalization, and asset encoding.

use pdf3d_core::error::{AppError, ErrorKind};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the mesh stage of a job.
#[derive(Debug, Error)]
pub enum MeshError {
    /// The artifact could not be read or parsed.
    #[error("Failed to load mesh from {path}: {source}")]
    Load {
        /// The artifact path.
        path: PathBuf,
        /// Underlying reader error.
        #[source]
        source: std::io::Error,
    },

    /// The mesh has no faces.
    #[error("Mesh has no faces")]
    Empty,

    /// A face references a vertex that does not exist.
    #[error("Face {face} references vertex {index}, but only {vertex_count} vertices exist")]
    InvalidIndex {
        /// Offending face.
        face: usize,
        /// Offending index.
        index: usize,
        /// Number of vertices.
        vertex_count: usize,
    },

    /// A vertex coordinate or the derived scale factor is not finite.
    #[error("Non-finite geometry: {0}")]
    NonFinite(String),

    /// The encoder executable could not be started.
    #[error("Asset encoder not found: {program}")]
    EncoderNotFound {
        /// The configured program.
        program: String,
    },

    /// The encoder exited with a non-zero status.
    #[error("Asset encoder failed with code {code}: {stderr}")]
    EncoderFailed {
        /// Exit code, `-1` when terminated by a signal.
        code: i32,
        /// Captured stderr output.
        stderr: String,
    },

    /// The encoder did not finish in time.
    #[error("Asset encoder timed out after {0} seconds")]
    EncoderTimeout(u64),

    /// The encoder reported success but produced no asset.
    #[error("Encoded asset not created: {0}")]
    EncoderOutputMissing(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MeshError {
    /// Whether the failure happened while encoding the interchange asset
    /// rather than while loading or normalizing geometry.
    pub fn is_encoding(&self) -> bool {
        matches!(
            self,
            Self::EncoderNotFound { .. }
                | Self::EncoderFailed { .. }
                | Self::EncoderTimeout(_)
                | Self::EncoderOutputMissing(_)
        )
    }
}

impl From<MeshError> for AppError {
    fn from(err: MeshError) -> Self {
        if err.is_encoding() {
            return AppError::external_tool(err.to_string());
        }
        match &err {
            MeshError::Io(_) => AppError::new(ErrorKind::Storage, err.to_string()),
            _ => AppError::geometry(err.to_string()),
        }
    }
}

/// Non-fatal failure while deriving a visual attribute.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    /// More than two faces share one edge, so winding cannot be propagated.
    #[error("Edge ({0}, {1}) is shared by more than two faces")]
    NonManifoldEdge(usize, usize),

    /// The surface has no consistent orientation (e.g. a Moebius strip).
    #[error("Surface is not orientable around face {0}")]
    NonOrientable(usize),

    /// Every face has zero area.
    #[error("All {0} faces are degenerate")]
    Degenerate(usize),
}
