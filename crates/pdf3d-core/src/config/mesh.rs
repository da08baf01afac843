//! Mesh normalization and asset encoding configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Mesh normalizer and interchange asset settings.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct MeshConfig {
    /// Radius of the bounding sphere every normalized mesh is scaled to.
    #[serde(default = "default_canonical_radius")]
    #[validate(range(exclusive_min = 0.0))]
    pub canonical_radius: f64,
    /// Uniform RGBA face color.
    #[serde(default = "default_face_color")]
    pub face_color: [u8; 4],
    /// IDTF to U3D converter executable.
    #[serde(default = "default_encoder_program")]
    #[validate(length(min = 1))]
    pub encoder_program: String,
    /// Converter arguments; `{input}` and `{output}` are substituted.
    #[serde(default = "default_encoder_args")]
    pub encoder_args: Vec<String>,
    /// Timeout for a single encoder run.
    #[serde(default = "default_encoder_timeout_seconds")]
    #[validate(range(min = 1, max = 3600))]
    pub encoder_timeout_seconds: u64,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            canonical_radius: default_canonical_radius(),
            face_color: default_face_color(),
            encoder_program: default_encoder_program(),
            encoder_args: default_encoder_args(),
            encoder_timeout_seconds: default_encoder_timeout_seconds(),
        }
    }
}

fn default_canonical_radius() -> f64 {
    10.0
}

fn default_face_color() -> [u8; 4] {
    [200, 200, 200, 255]
}

fn default_encoder_program() -> String {
    "IDTFConverter".to_string()
}

fn default_encoder_args() -> Vec<String> {
    vec![
        "-input".to_string(),
        "{input}".to_string(),
        "-output".to_string(),
        "{output}".to_string(),
    ]
}

fn default_encoder_timeout_seconds() -> u64 {
    120
}
