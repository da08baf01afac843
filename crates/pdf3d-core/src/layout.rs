//! Resolved filesystem layout shared by every pipeline stage.
//!
//! Paths under the temporary area are not job-scoped: one descriptor, one
//! artifact, one log, and one processor document are reused by every job.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::layout::LayoutConfig;
use crate::error::AppError;
use crate::result::AppResult;

/// Absolute paths of the three working areas and their well-known files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Source documents.
    pub input_dir: PathBuf,
    /// Temporary working area.
    pub temp_dir: PathBuf,
    /// Finished documents.
    pub output_dir: PathBuf,
    /// Job descriptor.
    pub job_file: PathBuf,
    /// Exported mesh artifact.
    pub artifact_file: PathBuf,
    /// Worker log.
    pub log_file: PathBuf,
    /// Processor (trigger) document.
    pub processor_file: PathBuf,
    /// Rendered template.
    pub template_file: PathBuf,
    /// Asset referenced by the template.
    pub asset_file: PathBuf,
    /// Recognized source extensions, lowercase, without the dot.
    pub extensions: Vec<String>,
}

impl Layout {
    /// Resolve a layout configuration against its root.
    ///
    /// A relative root is made absolute against the current directory so the
    /// job descriptor always carries an absolute source path.
    pub fn from_config(config: &LayoutConfig) -> AppResult<Self> {
        let root = if config.root.is_absolute() {
            config.root.clone()
        } else {
            std::env::current_dir()?.join(&config.root)
        };
        Ok(Self::under(&root, config))
    }

    /// Resolve a layout configuration under an explicit absolute root.
    pub fn under(root: &Path, config: &LayoutConfig) -> Self {
        let temp_dir = root.join(&config.temp_dir);
        Self {
            input_dir: root.join(&config.input_dir),
            output_dir: root.join(&config.output_dir),
            job_file: temp_dir.join(&config.job_file),
            artifact_file: temp_dir.join(&config.artifact_file),
            log_file: temp_dir.join(&config.log_file),
            processor_file: temp_dir.join(&config.processor_file),
            template_file: temp_dir.join(&config.template_file),
            asset_file: temp_dir.join(&config.asset_file),
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            temp_dir,
        }
    }

    /// Create the input, temporary, and output areas if missing.
    pub fn ensure_directories(&self) -> AppResult<()> {
        for dir in [&self.input_dir, &self.temp_dir, &self.output_dir] {
            if !dir.exists() {
                debug!(dir = %dir.display(), "Creating pipeline directory");
                std::fs::create_dir_all(dir).map_err(|e| {
                    AppError::with_source(
                        crate::ErrorKind::Storage,
                        format!("Failed to create directory {}", dir.display()),
                        e,
                    )
                })?;
            }
        }
        Ok(())
    }

    /// Path of a per-source intermediate file in the temporary area,
    /// e.g. `Temp/part_a.stl`.
    pub fn intermediate(&self, stem: &str, extension: &str) -> PathBuf {
        self.temp_dir.join(format!("{stem}.{extension}"))
    }

    /// Final document path for a source stem.
    pub fn document_for(&self, stem: &str) -> PathBuf {
        self.output_dir.join(format!("{stem}.pdf"))
    }
}

/// Move `from` to `to`, replacing any file already at `to`.
///
/// Falls back to copy and delete when a rename is not possible, e.g. across
/// volumes.
pub fn move_replacing(from: &Path, to: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(to) {
        Ok(()) => debug!(path = %to.display(), "Replaced existing file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    if std::fs::rename(from, to).is_err() {
        std::fs::copy(from, to)?;
        std::fs::remove_file(from)?;
    }
    Ok(())
}
