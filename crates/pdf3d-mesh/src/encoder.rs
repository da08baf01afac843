//! Encoding of IDTF scenes into the embeddable U3D asset.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{error, info};

use pdf3d_core::config::mesh::MeshConfig;

use crate::error::MeshError;

/// Turns an IDTF scene into an interchange asset.
#[async_trait]
pub trait AssetEncoder: Send + Sync {
    /// Encode `scene` into `output`, replacing any existing file.
    async fn encode(&self, scene: &Path, output: &Path) -> Result<(), MeshError>;
}

/// Runs the external IDTF to U3D converter.
#[derive(Debug, Clone)]
pub struct IdtfConverter {
    program: String,
    args: Vec<String>,
    timeout_seconds: u64,
}

impl IdtfConverter {
    /// Create a converter from configuration.
    pub fn new(config: &MeshConfig) -> Self {
        Self {
            program: config.encoder_program.clone(),
            args: config.encoder_args.clone(),
            timeout_seconds: config.encoder_timeout_seconds,
        }
    }

    /// Substitute `{input}` and `{output}` in the argument template.
    pub fn substitute_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace("{input}", &input).replace("{output}", &output))
            .collect()
    }
}

#[async_trait]
impl AssetEncoder for IdtfConverter {
    async fn encode(&self, scene: &Path, output: &Path) -> Result<(), MeshError> {
        let args = self.substitute_args(scene, output);
        info!(program = %self.program, ?args, "Encoding asset");

        match tokio::fs::remove_file(output).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = scene.parent().filter(|d| !d.as_os_str().is_empty()) {
            cmd.current_dir(dir);
        }

        let timeout = Duration::from_secs(self.timeout_seconds);
        let output_status = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(out)) => out,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MeshError::EncoderNotFound {
                    program: self.program.clone(),
                });
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                error!(timeout_seconds = self.timeout_seconds, "Asset encoder timed out");
                return Err(MeshError::EncoderTimeout(self.timeout_seconds));
            }
        };

        if !output_status.status.success() {
            let stderr = String::from_utf8_lossy(&output_status.stderr);
            return Err(MeshError::EncoderFailed {
                code: output_status.status.code().unwrap_or(-1),
                stderr: stderr.trim().chars().take(2000).collect(),
            });
        }

        match tokio::fs::metadata(output).await {
            Ok(meta) if meta.len() > 0 => {
                info!(asset = %output.display(), size = meta.len(), "Asset encoded");
                Ok(())
            }
            _ => Err(MeshError::EncoderOutputMissing(PathBuf::from(output))),
        }
    }
}
