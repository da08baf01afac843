//! Typesetting compiler invocation.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use pdf3d_core::config::document::DocumentConfig;

use crate::error::DocumentError;

/// A black-box compiler: template file in, document file next to it out.
#[async_trait]
pub trait DocumentCompiler: Send + Sync {
    /// Compile `template` inside its own directory.
    ///
    /// Returning `Ok` does not imply a document was produced; callers check
    /// for [`expected_output`] themselves.
    async fn compile(&self, template: &Path) -> Result<(), DocumentError>;
}

/// The document a compiler is expected to produce for `template`.
pub fn expected_output(template: &Path) -> PathBuf {
    template.with_extension("pdf")
}

/// Runs `pdflatex` (or a configured replacement).
#[derive(Debug, Clone)]
pub struct LatexCompiler {
    program: String,
    args: Vec<String>,
    timeout_seconds: u64,
}

impl LatexCompiler {
    /// Create a compiler from configuration.
    pub fn new(config: &DocumentConfig) -> Self {
        Self {
            program: config.compiler.clone(),
            args: config.compiler_args.clone(),
            timeout_seconds: config.compiler_timeout_seconds,
        }
    }

    /// Arguments with `{template}` replaced by the template file name.
    pub fn substitute_args(&self, template: &Path) -> Vec<String> {
        let name = template
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.args
            .iter()
            .map(|arg| arg.replace("{template}", &name))
            .collect()
    }
}

#[async_trait]
impl DocumentCompiler for LatexCompiler {
    async fn compile(&self, template: &Path) -> Result<(), DocumentError> {
        let args = self.substitute_args(template);
        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = template.parent().filter(|d| !d.as_os_str().is_empty()) {
            cmd.current_dir(dir);
        }

        debug!(program = %self.program, ?args, "Running document compiler");
        let timeout = Duration::from_secs(self.timeout_seconds);
        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DocumentError::CompilerNotFound {
                    program: self.program.clone(),
                });
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(DocumentError::CompilerTimeout(self.timeout_seconds)),
        };

        // pdflatex in nonstopmode exits non-zero on recoverable warnings too.
        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let tail: Vec<&str> = stdout.lines().rev().take(5).collect();
            warn!(
                code = output.status.code().unwrap_or(-1),
                tail = %tail.into_iter().rev().collect::<Vec<_>>().join(" | "),
                "Document compiler reported problems"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiler(program: &str, args: &[&str]) -> LatexCompiler {
        LatexCompiler::new(&DocumentConfig {
            compiler: program.to_string(),
            compiler_args: args.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        })
    }

    #[test]
    fn test_default_args() {
        let c = LatexCompiler::new(&DocumentConfig::default());
        assert_eq!(
            c.substitute_args(Path::new("/p/Temp/render.tex")),
            vec!["-interaction=nonstopmode", "render.tex"]
        );
        assert_eq!(
            expected_output(Path::new("/p/Temp/render.tex")),
            PathBuf::from("/p/Temp/render.pdf")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_in_template_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let template = temp.path().join("render.tex");
        std::fs::write(&template, "x").expect("write");

        // Relative output only lands next to the template if cwd is its dir.
        compiler("sh", &["-c", "cp \"$0\" render.pdf", "{template}"])
            .compile(&template)
            .await
            .expect("compile");
        assert!(expected_output(&template).exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_not_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let template = temp.path().join("render.tex");
        compiler("sh", &["-c", "echo '! Undefined control sequence.'; exit 1"])
            .compile(&template)
            .await
            .expect("compile returns ok");
        assert!(!expected_output(&template).exists());
    }

    #[tokio::test]
    async fn test_missing_compiler() {
        let err = compiler("no-such-pdflatex", &[])
            .compile(Path::new("render.tex"))
            .await
            .expect_err("missing");
        assert!(matches!(err, DocumentError::CompilerNotFound { .. }));
    }
}
