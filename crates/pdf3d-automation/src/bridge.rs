//! Command-line bridge to the CAD application's automation interface.
//!
//! Each capability is one child process: `program [args..] <verb> [document]`.
//! The bridge script holds the application session between invocations.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info};

use pdf3d_core::config::application::ApplicationConfig;

use crate::application::{CadApplication, DocumentHandle};
use crate::error::AutomationError;

/// Stdout token the `attach` verb prints when an instance was found.
pub const ATTACHED: &str = "attached";

/// [`CadApplication`] that shells out to a bridge program.
#[derive(Debug, Clone)]
pub struct CommandBridge {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandBridge {
    /// Create a bridge from configuration.
    pub fn new(config: &ApplicationConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.command_timeout_seconds),
        }
    }

    /// Full argument list for a verb.
    pub fn command_line(&self, verb: &str, document: Option<&Path>) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(verb.to_string());
        if let Some(doc) = document {
            args.push(doc.to_string_lossy().into_owned());
        }
        args
    }

    /// Run one verb and return its trimmed stdout.
    async fn invoke(&self, verb: &str, document: Option<&Path>) -> Result<String, AutomationError> {
        let args = self.command_line(verb, document);
        debug!(program = %self.program, ?args, "Invoking automation bridge");

        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                error!(program = %self.program, "Automation bridge not found");
                return Err(AutomationError::BridgeNotFound {
                    program: self.program.clone(),
                });
            }
            Ok(Err(e)) => return Err(AutomationError::Io(e)),
            Err(_) => {
                error!(verb, timeout_seconds = self.timeout.as_secs(), "Bridge timed out");
                return Err(AutomationError::BridgeTimeout {
                    verb: verb.to_string(),
                    timeout_seconds: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AutomationError::BridgeFailed {
                verb: verb.to_string(),
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.trim().chars().take(2000).collect(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl CadApplication for CommandBridge {
    async fn attach(&self) -> Result<bool, AutomationError> {
        let reply = self.invoke("attach", None).await?;
        Ok(reply.lines().any(|l| l.trim() == ATTACHED))
    }

    async fn launch(&self) -> Result<(), AutomationError> {
        self.invoke("launch", None).await?;
        Ok(())
    }

    async fn set_silent(&self, silent: bool) -> Result<(), AutomationError> {
        let verb = if silent { "silent" } else { "interactive" };
        self.invoke(verb, None).await?;
        Ok(())
    }

    async fn open_document(&self, path: &Path) -> Result<DocumentHandle, AutomationError> {
        self.invoke("open", Some(path)).await?;
        info!(document = %path.display(), "Document opened");
        Ok(DocumentHandle {
            path: path.to_path_buf(),
        })
    }

    async fn close_document(&self, document: &DocumentHandle) -> Result<(), AutomationError> {
        self.invoke("close", Some(&document.path)).await?;
        debug!(document = %document.path.display(), "Document closed without saving");
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn bridge(script: &str) -> CommandBridge {
        CommandBridge::new(&ApplicationConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "bridge".to_string()],
            command_timeout_seconds: 5,
        })
    }

    #[test]
    fn test_command_line_appends_verb_and_document() {
        let b = bridge("true");
        assert_eq!(
            b.command_line("open", Some(Path::new("/t/Processor.ipt"))),
            vec!["-c", "true", "bridge", "open", "/t/Processor.ipt"]
        );
        assert_eq!(b.command_line("launch", None).last().map(String::as_str), Some("launch"));
    }

    #[tokio::test]
    async fn test_attach_reads_reply() {
        let running = bridge(r#"[ "$1" = attach ] && echo attached"#);
        assert!(running.attach().await.expect("attach"));

        let idle = bridge(r#"echo not-running"#);
        assert!(!idle.attach().await.expect("attach"));
    }

    #[tokio::test]
    async fn test_open_and_close_round_trip() {
        let b = bridge(r#"case "$1" in open|close) [ -n "$2" ] ;; *) exit 3 ;; esac"#);
        let doc = b
            .open_document(Path::new("/t/Processor.ipt"))
            .await
            .expect("open");
        b.close_document(&doc).await.expect("close");
    }

    #[tokio::test]
    async fn test_failure_carries_stderr() {
        let b = bridge("echo 'COM object unavailable' >&2; exit 4");
        match b.set_silent(true).await {
            Err(AutomationError::BridgeFailed { verb, code, stderr }) => {
                assert_eq!(verb, "silent");
                assert_eq!(code, 4);
                assert_eq!(stderr, "COM object unavailable");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program() {
        let b = CommandBridge::new(&ApplicationConfig {
            program: "definitely-not-a-bridge-binary".to_string(),
            args: Vec::new(),
            command_timeout_seconds: 5,
        });
        let err = b.launch().await.expect_err("missing");
        assert!(matches!(err, AutomationError::BridgeNotFound { .. }));
        assert!(err.is_application_fault());
    }

    #[tokio::test]
    async fn test_timeout() {
        let b = CommandBridge::new(&ApplicationConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "sleep 5".to_string(), "bridge".to_string()],
            command_timeout_seconds: 1,
        });
        assert!(matches!(
            b.launch().await,
            Err(AutomationError::BridgeTimeout { .. })
        ));
    }
}
