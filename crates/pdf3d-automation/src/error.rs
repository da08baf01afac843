//! Error type for job hand-off and CAD application control.

use pdf3d_core::error::{AppError, ErrorKind};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing a job or driving the CAD application.
#[derive(Debug, Error)]
pub enum AutomationError {
    /// The processor document is absent; the job cannot be triggered.
    #[error("Processor document not found: {path}")]
    ProcessorMissing {
        /// Expected location of the processor document.
        path: PathBuf,
    },

    /// The bridge executable could not be started.
    #[error("Automation bridge not found: {program}")]
    BridgeNotFound {
        /// The configured program.
        program: String,
    },

    /// A bridge invocation exited with a non-zero status.
    #[error("Bridge verb '{verb}' failed with code {code}: {stderr}")]
    BridgeFailed {
        /// The capability that was invoked.
        verb: String,
        /// Exit code, `-1` when terminated by a signal.
        code: i32,
        /// Captured stderr output.
        stderr: String,
    },

    /// A bridge invocation did not return in time.
    #[error("Bridge verb '{verb}' timed out after {timeout_seconds}s")]
    BridgeTimeout {
        /// The capability that was invoked.
        verb: String,
        /// The timeout that was exceeded.
        timeout_seconds: u64,
    },

    /// The source path has no usable file name.
    #[error("Source path has no file name: {path}")]
    InvalidSource {
        /// The offending path.
        path: PathBuf,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AutomationError {
    /// Whether the failure lies with the external application rather than
    /// with the local filesystem or configuration.
    pub fn is_application_fault(&self) -> bool {
        matches!(
            self,
            Self::BridgeNotFound { .. } | Self::BridgeFailed { .. } | Self::BridgeTimeout { .. }
        )
    }
}

impl From<AutomationError> for AppError {
    fn from(err: AutomationError) -> Self {
        match &err {
            AutomationError::ProcessorMissing { .. } => AppError::not_found(err.to_string()),
            AutomationError::InvalidSource { .. } => AppError::validation(err.to_string()),
            AutomationError::Io(_) => AppError::new(ErrorKind::Storage, err.to_string()),
            _ => AppError::external_application(err.to_string()),
        }
    }
}
