//! The narrow set of CAD application capabilities the pipeline relies on.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::AutomationError;

/// An open document inside the CAD application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    /// Path the document was opened from.
    pub path: PathBuf,
}

/// Capabilities of an external CAD application.
///
/// Opening the processor document is what triggers the application-side
/// export; the pipeline never calls the exporter directly.
#[async_trait]
pub trait CadApplication: Send + Sync {
    /// Attach to a running instance. `Ok(false)` when none is running.
    async fn attach(&self) -> Result<bool, AutomationError>;

    /// Start a new, visible instance.
    async fn launch(&self) -> Result<(), AutomationError>;

    /// Toggle silent mode, which suppresses modal dialogs.
    async fn set_silent(&self, silent: bool) -> Result<(), AutomationError>;

    /// Open a document.
    async fn open_document(&self, path: &Path) -> Result<DocumentHandle, AutomationError>;

    /// Close a document without saving.
    async fn close_document(&self, document: &DocumentHandle) -> Result<(), AutomationError>;

    /// Attach to a running instance, or launch one when none is running.
    async fn attach_or_launch(&self) -> Result<(), AutomationError> {
        if self.attach().await? {
            info!("Attached to running CAD application");
        } else {
            info!("No running CAD application, launching");
            self.launch().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<T: CadApplication + ?Sized> CadApplication for Arc<T> {
    async fn attach(&self) -> Result<bool, AutomationError> {
        (**self).attach().await
    }

    async fn launch(&self) -> Result<(), AutomationError> {
        (**self).launch().await
    }

    async fn set_silent(&self, silent: bool) -> Result<(), AutomationError> {
        (**self).set_silent(silent).await
    }

    async fn open_document(&self, path: &Path) -> Result<DocumentHandle, AutomationError> {
        (**self).open_document(path).await
    }

    async fn close_document(&self, document: &DocumentHandle) -> Result<(), AutomationError> {
        (**self).close_document(document).await
    }

    async fn attach_or_launch(&self) -> Result<(), AutomationError> {
        (**self).attach_or_launch().await
    }
}
