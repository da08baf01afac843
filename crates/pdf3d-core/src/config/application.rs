//! Automation bridge configuration for the external CAD application.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// How the pipeline reaches the CAD application.
///
/// Every capability is a single invocation of `program` with `args`
/// followed by a verb (`attach`, `launch`, `silent`, `interactive`, `open`,
/// `close`) and, for document verbs, the document path.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Bridge executable.
    #[serde(default = "default_program")]
    #[validate(length(min = 1))]
    pub program: String,
    /// Arguments placed before the verb.
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Timeout for a single bridge invocation.
    #[serde(default = "default_command_timeout_seconds")]
    #[validate(range(min = 1, max = 600))]
    pub command_timeout_seconds: u64,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            command_timeout_seconds: default_command_timeout_seconds(),
        }
    }
}

fn default_program() -> String {
    "powershell".to_string()
}

fn default_args() -> Vec<String> {
    vec![
        "-NoProfile".to_string(),
        "-ExecutionPolicy".to_string(),
        "Bypass".to_string(),
        "-File".to_string(),
        "scripts/inventor-bridge.ps1".to_string(),
    ]
}

fn default_command_timeout_seconds() -> u64 {
    30
}
