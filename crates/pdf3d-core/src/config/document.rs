//! Document assembly configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Typesetting compiler and template settings.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Compiler executable.
    #[serde(default = "default_compiler")]
    #[validate(length(min = 1))]
    pub compiler: String,
    /// Compiler arguments; `{template}` is substituted with the template file name.
    #[serde(default = "default_compiler_args")]
    pub compiler_args: Vec<String>,
    /// Timeout for a single compiler run.
    #[serde(default = "default_compiler_timeout_seconds")]
    #[validate(range(min = 1, max = 3600))]
    pub compiler_timeout_seconds: u64,
    /// Custom template; the built-in one is used when unset.
    #[serde(default)]
    pub template_path: Option<PathBuf>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            compiler: default_compiler(),
            compiler_args: default_compiler_args(),
            compiler_timeout_seconds: default_compiler_timeout_seconds(),
            template_path: None,
        }
    }
}

fn default_compiler() -> String {
    "pdflatex".to_string()
}

fn default_compiler_args() -> Vec<String> {
    vec![
        "-interaction=nonstopmode".to_string(),
        "{template}".to_string(),
    ]
}

fn default_compiler_timeout_seconds() -> u64 {
    180
}
