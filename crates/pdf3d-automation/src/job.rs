//! Jobs and the job descriptor hand-off.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use pdf3d_core::Layout;

use crate::error::AutomationError;
use crate::source::SourceKind;

/// One source-document-to-output-document conversion attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Absolute path of the source document.
    pub source_path: PathBuf,
    /// Source file name, e.g. `part_a.ipt`.
    pub file_name: String,
    /// Source base name, e.g. `part_a`; names every derived file.
    pub stem: String,
    /// Detected document kind.
    pub kind: SourceKind,
}

impl Job {
    /// Build a job for a source document, making its path absolute.
    pub fn new(path: &Path) -> Result<Self, AutomationError> {
        let source_path = std::path::absolute(path)?;
        let file_name = source_path
            .file_name()
            .and_then(|f| f.to_str())
            .map(|s| s.to_string())
            .ok_or_else(|| AutomationError::InvalidSource {
                path: path.to_path_buf(),
            })?;
        let stem = source_path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .ok_or_else(|| AutomationError::InvalidSource {
                path: path.to_path_buf(),
            })?;

        Ok(Self {
            kind: SourceKind::from_path(&source_path),
            source_path,
            file_name,
            stem,
        })
    }

    /// The descriptor content: the absolute source path, nothing else.
    pub fn descriptor(&self) -> String {
        self.source_path.to_string_lossy().into_owned()
    }
}

/// Writes the job descriptor the CAD application reads on trigger.
///
/// The artifact and log paths are shared by every job, so stale copies are
/// removed before the new descriptor is written.
#[derive(Debug, Clone)]
pub struct JobDescriptorWriter {
    job_file: PathBuf,
    artifact_file: PathBuf,
    log_file: PathBuf,
}

impl JobDescriptorWriter {
    /// Create a writer for the layout's well-known files.
    pub fn new(layout: &Layout) -> Self {
        Self {
            job_file: layout.job_file.clone(),
            artifact_file: layout.artifact_file.clone(),
            log_file: layout.log_file.clone(),
        }
    }

    /// Clear the previous job's signals and write this job's descriptor.
    pub async fn prepare(&self, job: &Job) -> Result<(), AutomationError> {
        remove_if_exists(&self.artifact_file).await?;
        remove_if_exists(&self.log_file).await?;

        tokio::fs::write(&self.job_file, job.descriptor()).await?;
        debug!(
            descriptor = %self.job_file.display(),
            source = %job.source_path.display(),
            "Job descriptor written"
        );
        Ok(())
    }

    /// Path of the descriptor file.
    pub fn job_file(&self) -> &Path {
        &self.job_file
    }
}

async fn remove_if_exists(path: &Path) -> Result<(), AutomationError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Removed stale file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf3d_core::config::layout::LayoutConfig;

    fn scratch() -> (tempfile::TempDir, Layout) {
        let temp = tempfile::tempdir().expect("tempdir");
        let layout = Layout::under(temp.path(), &LayoutConfig::default());
        layout.ensure_directories().expect("dirs");
        (temp, layout)
    }

    #[test]
    fn test_job_names() {
        let job = Job::new(Path::new("/in/part_a.ipt")).expect("job");
        assert_eq!(job.file_name, "part_a.ipt");
        assert_eq!(job.stem, "part_a");
        assert_eq!(job.kind, SourceKind::InventorPart);
        assert_eq!(job.descriptor(), job.source_path.to_string_lossy());
    }

    #[test]
    fn test_job_relative_path_made_absolute() {
        let job = Job::new(Path::new("relative/drawing.dwg")).expect("job");
        assert!(job.source_path.is_absolute());
    }

    #[test]
    fn test_job_without_stem_rejected() {
        assert!(matches!(
            Job::new(Path::new("/")),
            Err(AutomationError::InvalidSource { .. })
        ));
    }

    #[tokio::test]
    async fn test_prepare_removes_stale_signals() {
        let (_temp, layout) = scratch();
        std::fs::write(&layout.artifact_file, vec![1u8; 512]).expect("artifact");
        std::fs::write(&layout.log_file, "ERROR: previous job").expect("log");

        let job = Job::new(&layout.input_dir.join("part_a.ipt")).expect("job");
        JobDescriptorWriter::new(&layout)
            .prepare(&job)
            .await
            .expect("prepare");

        assert!(!layout.artifact_file.exists());
        assert!(!layout.log_file.exists());
        let content = std::fs::read_to_string(&layout.job_file).expect("read");
        assert_eq!(content, job.descriptor());
        assert_eq!(content.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_prepare_overwrites_descriptor() {
        let (_temp, layout) = scratch();
        let writer = JobDescriptorWriter::new(&layout);

        let first = Job::new(&layout.input_dir.join("first_long_name.iam")).expect("job");
        let second = Job::new(&layout.input_dir.join("b.ipt")).expect("job");
        writer.prepare(&first).await.expect("first");
        writer.prepare(&second).await.expect("second");

        let content = std::fs::read_to_string(writer.job_file()).expect("read");
        assert_eq!(content, second.descriptor());
    }
}
