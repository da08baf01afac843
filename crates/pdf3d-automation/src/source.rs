//! Recognized source documents and input discovery.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use tracing::warn;

use pdf3d_core::Layout;

use crate::error::AutomationError;
use crate::job::Job;

// ---------------------------------------------------------------------------
// Extension map macro
// ---------------------------------------------------------------------------

macro_rules! define_source_kinds {
    ($($variant:ident => $ext:literal),* $(,)?) => {
        static EXTENSION_MAP: LazyLock<HashMap<&'static str, SourceKind>> = LazyLock::new(|| {
            HashMap::from([$(($ext, SourceKind::$variant),)*])
        });
    };
}

define_source_kinds! {
    RevitProject     => "rvt",
    AutoCadDrawing   => "dwg",
    DrawingExchange  => "dxf",
    InventorPart     => "ipt",
    InventorAssembly => "iam",
}

/// Kind of CAD source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Revit project (.rvt)
    RevitProject,
    /// AutoCAD drawing (.dwg)
    AutoCadDrawing,
    /// Drawing exchange format (.dxf)
    DrawingExchange,
    /// Inventor part (.ipt)
    InventorPart,
    /// Inventor assembly (.iam)
    InventorAssembly,
    /// Configured extension without a dedicated kind
    Other,
}

impl SourceKind {
    /// Determine the kind from a path's extension, case-insensitively.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .and_then(|e| EXTENSION_MAP.get(e.as_str()).copied())
            .unwrap_or(SourceKind::Other)
    }

    /// Drawing formats are frequently 2D and end as `SKIPPED_NON_3D`.
    pub fn is_drawing(&self) -> bool {
        matches!(self, SourceKind::AutoCadDrawing | SourceKind::DrawingExchange)
    }
}

/// Whether `path` carries one of `extensions` (lowercase, no dot).
pub fn has_recognized_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            extensions.iter().any(|x| *x == lower)
        })
        .unwrap_or(false)
}

/// List the input area's recognized documents as jobs, ordered by file name.
///
/// A document that cannot become a job is logged and left out; only a
/// failure to read the input area itself is an error.
pub fn discover_sources(layout: &Layout) -> Result<Vec<Job>, AutomationError> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(&layout.input_dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && has_recognized_extension(&path, &layout.extensions) {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let jobs = paths
        .iter()
        .filter_map(|p| match Job::new(p) {
            Ok(job) => Some(job),
            Err(e) => {
                warn!(source = %p.display(), error = %e, "Skipping unusable source");
                None
            }
        })
        .collect();
    Ok(jobs)
}
