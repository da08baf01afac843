//! Triggers one export inside the CAD application and watches for its end.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use pdf3d_core::Layout;

use crate::application::{CadApplication, DocumentHandle};
use crate::error::AutomationError;
use crate::job::{Job, JobDescriptorWriter};
use crate::watcher::{CompletionWatcher, FsProbe, Observation, Outcome, SignalProbe};

/// Application state acquired for one job.
///
/// Every step that was attempted is undone by [`ApplicationSession::release`],
/// which never fails: release problems are logged and swallowed.
#[derive(Debug, Default)]
pub struct ApplicationSession {
    silenced: bool,
    document: Option<DocumentHandle>,
}

impl ApplicationSession {
    /// Attach or launch, enter silent mode, and open the processor document.
    ///
    /// On failure the partially acquired session is returned alongside the
    /// error so it can still be released.
    pub async fn acquire<A: CadApplication + ?Sized>(
        app: &A,
        processor: &Path,
    ) -> (Self, Result<(), AutomationError>) {
        let mut session = Self::default();
        let result = session.acquire_steps(app, processor).await;
        (session, result)
    }

    async fn acquire_steps<A: CadApplication + ?Sized>(
        &mut self,
        app: &A,
        processor: &Path,
    ) -> Result<(), AutomationError> {
        app.attach_or_launch().await?;

        // Marked before issuing: a failed or timed-out call may have taken effect.
        self.silenced = true;
        app.set_silent(true).await?;

        self.document = Some(DocumentHandle {
            path: processor.to_path_buf(),
        });
        self.document = Some(app.open_document(processor).await?);
        Ok(())
    }

    /// Close the document without saving and leave silent mode.
    pub async fn release<A: CadApplication + ?Sized>(mut self, app: &A) {
        if let Some(document) = self.document.take() {
            if let Err(e) = app.close_document(&document).await {
                warn!(error = %e, document = %document.path.display(), "Failed to close document");
            }
        }
        if self.silenced {
            if let Err(e) = app.set_silent(false).await {
                warn!(error = %e, "Failed to leave silent mode");
            }
        }
    }

    /// Acquire, run `body` while the document is open, then release.
    pub async fn run<A, F, Fut, T>(
        app: &A,
        processor: &Path,
        body: F,
    ) -> Result<T, AutomationError>
    where
        A: CadApplication + ?Sized,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        let (session, acquired) = Self::acquire(app, processor).await;
        let result = match acquired {
            Ok(()) => Ok(body().await),
            Err(e) => Err(e),
        };
        session.release(app).await;
        result
    }
}

/// Drives one job through the CAD application.
pub struct ExportController<A: CadApplication> {
    app: A,
    writer: JobDescriptorWriter,
    processor: PathBuf,
    watcher: CompletionWatcher,
    probe: Box<dyn SignalProbe>,
}

impl<A: CadApplication> ExportController<A> {
    /// Create a controller watching the layout's real signal files.
    pub fn new(app: A, layout: &Layout, watcher: CompletionWatcher) -> Self {
        Self::with_probe(app, layout, watcher, Box::new(FsProbe::for_layout(layout)))
    }

    /// Create a controller with an explicit probe.
    pub fn with_probe(
        app: A,
        layout: &Layout,
        watcher: CompletionWatcher,
        probe: Box<dyn SignalProbe>,
    ) -> Self {
        Self {
            app,
            writer: JobDescriptorWriter::new(layout),
            processor: layout.processor_file.clone(),
            watcher,
            probe,
        }
    }

    /// The application under control.
    pub fn application(&self) -> &A {
        &self.app
    }

    /// Hand a job to the application and wait for its terminal outcome.
    ///
    /// Returns `Err` only when the export could not be triggered at all.
    pub async fn trigger(&self, job: &Job) -> Result<Observation, AutomationError> {
        if !self.processor.is_file() {
            error!(processor = %self.processor.display(), "Processor document missing");
            return Err(AutomationError::ProcessorMissing {
                path: self.processor.clone(),
            });
        }

        self.writer.prepare(job).await?;

        info!(job = %job.file_name, "Triggering export");
        let observation = ApplicationSession::run(&self.app, &self.processor, || {
            self.watcher.wait(self.probe.as_ref())
        })
        .await?;

        match observation.outcome {
            Outcome::Success => info!(job = %job.file_name, polls = observation.polls, "Export finished"),
            Outcome::SkippedNon3d => info!(job = %job.file_name, "No 3D content, skipped"),
            Outcome::Error => error!(
                job = %job.file_name,
                log = observation.log.as_deref().unwrap_or_default(),
                "Export reported an error"
            ),
            Outcome::Timeout => warn!(
                job = %job.file_name,
                elapsed_ms = observation.elapsed.as_millis() as u64,
                "Export timed out"
            ),
        }

        Ok(observation)
    }
}
