//! Filesystem layout configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Root directory, the three working areas, and the well-known file names
/// inside the temporary area.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Pipeline root directory.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Source documents, relative to `root`.
    #[serde(default = "default_input_dir")]
    pub input_dir: String,
    /// Temporary working area, relative to `root`.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: String,
    /// Finished documents, relative to `root`.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Job descriptor read by the CAD application.
    #[serde(default = "default_job_file")]
    #[validate(length(min = 1))]
    pub job_file: String,
    /// Mesh exported by the CAD application.
    #[serde(default = "default_artifact_file")]
    #[validate(length(min = 1))]
    pub artifact_file: String,
    /// Worker log written by the CAD application.
    #[serde(default = "default_log_file")]
    #[validate(length(min = 1))]
    pub log_file: String,
    /// Document whose opening fires the export automation.
    #[serde(default = "default_processor_file")]
    #[validate(length(min = 1))]
    pub processor_file: String,
    /// Rendered typesetting template.
    #[serde(default = "default_template_file")]
    #[validate(length(min = 1))]
    pub template_file: String,
    /// 3D asset name referenced by the template.
    #[serde(default = "default_asset_file")]
    #[validate(length(min = 1))]
    pub asset_file: String,
    /// Recognized source document extensions (without the dot).
    #[serde(default = "default_extensions")]
    #[validate(length(min = 1))]
    pub extensions: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            input_dir: default_input_dir(),
            temp_dir: default_temp_dir(),
            output_dir: default_output_dir(),
            job_file: default_job_file(),
            artifact_file: default_artifact_file(),
            log_file: default_log_file(),
            processor_file: default_processor_file(),
            template_file: default_template_file(),
            asset_file: default_asset_file(),
            extensions: default_extensions(),
        }
    }
}

fn default_root() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\3DPDF_Pipeline")
    } else {
        PathBuf::from("3DPDF_Pipeline")
    }
}

fn default_input_dir() -> String {
    "Input".to_string()
}

fn default_temp_dir() -> String {
    "Temp".to_string()
}

fn default_output_dir() -> String {
    "Output".to_string()
}

fn default_job_file() -> String {
    "job.txt".to_string()
}

fn default_artifact_file() -> String {
    "temp_export.stl".to_string()
}

fn default_log_file() -> String {
    "worker_log.txt".to_string()
}

fn default_processor_file() -> String {
    "Processor.ipt".to_string()
}

fn default_template_file() -> String {
    "render.tex".to_string()
}

fn default_asset_file() -> String {
    "model.u3d".to_string()
}

fn default_extensions() -> Vec<String> {
    ["rvt", "dwg", "dxf", "ipt", "iam"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
