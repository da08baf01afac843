//! Document assembly errors.

use pdf3d_core::error::{AppError, ErrorKind};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing or compiling a document.
///
/// A compiler that runs but produces no document is not an error; it is
/// reported as [`crate::AssemblyOutcome::CompileFailed`].
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The configured template file does not exist.
    #[error("Template not found: {0}")]
    TemplateMissing(PathBuf),

    /// The template lacks a required placeholder.
    #[error("Template is missing the {placeholder} placeholder")]
    TemplateInvalid {
        /// The absent placeholder.
        placeholder: &'static str,
    },

    /// The asset to embed does not exist.
    #[error("Asset not found: {0}")]
    AssetMissing(PathBuf),

    /// The compiler executable could not be started.
    #[error("Document compiler not found: {program}")]
    CompilerNotFound {
        /// The configured program.
        program: String,
    },

    /// The compiler did not finish in time.
    #[error("Document compiler timed out after {0} seconds")]
    CompilerTimeout(u64),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match &err {
            DocumentError::TemplateMissing(_) | DocumentError::AssetMissing(_) => {
                AppError::not_found(err.to_string())
            }
            DocumentError::TemplateInvalid { .. } => AppError::configuration(err.to_string()),
            DocumentError::Io(_) => AppError::new(ErrorKind::Storage, err.to_string()),
            _ => AppError::external_tool(err.to_string()),
        }
    }
}
