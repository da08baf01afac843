//! Document assembly: template, asset placement, compile, relocate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pdf3d_core::{Layout, move_replacing};

use crate::compiler::{DocumentCompiler, expected_output};
use crate::error::DocumentError;
use crate::template::DocumentTemplate;

/// Result of an assembly attempt that got as far as compiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssemblyOutcome {
    /// The document was produced and placed in the output area.
    Rendered {
        /// Final document path.
        document: PathBuf,
    },
    /// The compiler produced no document.
    CompileFailed {
        /// What went wrong.
        reason: String,
    },
}

/// Renders the template, places the asset, compiles, and relocates the result.
pub struct DocumentAssembler<C: DocumentCompiler> {
    template: DocumentTemplate,
    compiler: C,
    template_file: PathBuf,
    asset_file: PathBuf,
    output_dir: PathBuf,
}

impl<C: DocumentCompiler> DocumentAssembler<C> {
    /// Create an assembler working in the layout's temporary area.
    pub fn new(template: DocumentTemplate, compiler: C, layout: &Layout) -> Self {
        Self {
            template,
            compiler,
            template_file: layout.template_file.clone(),
            asset_file: layout.asset_file.clone(),
            output_dir: layout.output_dir.clone(),
        }
    }

    /// Assemble the document for `stem` around the freshly encoded `asset`.
    ///
    /// The asset is moved to the fixed name the template references. Only
    /// setup problems are returned as `Err`; compiler trouble becomes
    /// [`AssemblyOutcome::CompileFailed`].
    pub async fn assemble(&self, stem: &str, asset: &Path) -> Result<AssemblyOutcome, DocumentError> {
        if !asset.is_file() {
            return Err(DocumentError::AssetMissing(asset.to_path_buf()));
        }

        let asset_name = self
            .asset_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let rendered = self.template.render(stem, &asset_name);
        tokio::fs::write(&self.template_file, rendered).await?;

        if asset != self.asset_file {
            move_replacing(asset, &self.asset_file)?;
        }

        let produced = expected_output(&self.template_file);
        match tokio::fs::remove_file(&produced).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = self.compiler.compile(&self.template_file).await {
            warn!(error = %e, "Document compilation failed");
            return Ok(AssemblyOutcome::CompileFailed {
                reason: e.to_string(),
            });
        }

        if !produced.is_file() {
            warn!(expected = %produced.display(), "Compiler produced no document");
            return Ok(AssemblyOutcome::CompileFailed {
                reason: format!("{} was not produced", produced.display()),
            });
        }

        let document = self.output_dir.join(format!("{stem}.pdf"));
        move_replacing(&produced, &document)?;
        info!(document = %document.display(), "Document ready");
        Ok(AssemblyOutcome::Rendered { document })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pdf3d_core::config::layout::LayoutConfig;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Writes a document only when the template embeds the expected asset.
    struct FakeCompiler {
        produce: bool,
        runs: AtomicU32,
    }

    #[async_trait]
    impl DocumentCompiler for FakeCompiler {
        async fn compile(&self, template: &Path) -> Result<(), DocumentError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            let source = std::fs::read_to_string(template)?;
            let asset = template.with_file_name("model.u3d");
            if self.produce && source.contains("{model.u3d}") && asset.is_file() {
                std::fs::write(expected_output(template), b"%PDF-1.5")?;
            }
            Ok(())
        }
    }

    fn scratch(produce: bool) -> (tempfile::TempDir, Layout, DocumentAssembler<FakeCompiler>) {
        let temp = tempfile::tempdir().expect("tempdir");
        let layout = Layout::under(temp.path(), &LayoutConfig::default());
        layout.ensure_directories().expect("dirs");
        let assembler = DocumentAssembler::new(
            DocumentTemplate::builtin(),
            FakeCompiler {
                produce,
                runs: AtomicU32::new(0),
            },
            &layout,
        );
        (temp, layout, assembler)
    }

    #[tokio::test]
    async fn test_rendered_document_lands_in_output() {
        let (_temp, layout, assembler) = scratch(true);
        let asset = layout.intermediate("part_a", "u3d");
        std::fs::write(&asset, b"U3D").expect("asset");
        std::fs::write(&layout.asset_file, b"stale").expect("stale asset");

        let outcome = assembler.assemble("part_a", &asset).await.expect("assemble");
        let expected = layout.document_for("part_a");
        assert_eq!(
            outcome,
            AssemblyOutcome::Rendered {
                document: expected.clone()
            }
        );
        assert!(expected.is_file());
        assert!(!asset.exists());
        assert_eq!(std::fs::read(&layout.asset_file).expect("asset"), b"U3D");
        let tex = std::fs::read_to_string(&layout.template_file).expect("tex");
        assert!(tex.contains(r"Project: part\_a"));
    }

    #[tokio::test]
    async fn test_existing_document_is_replaced() {
        let (_temp, layout, assembler) = scratch(true);
        std::fs::write(layout.document_for("part_a"), b"old").expect("old");

        for _ in 0..2 {
            let asset = layout.intermediate("part_a", "u3d");
            std::fs::write(&asset, b"U3D").expect("asset");
            let outcome = assembler.assemble("part_a", &asset).await.expect("assemble");
            assert!(matches!(outcome, AssemblyOutcome::Rendered { .. }));
        }
        assert_eq!(
            std::fs::read(layout.document_for("part_a")).expect("doc"),
            b"%PDF-1.5"
        );
    }

    #[tokio::test]
    async fn test_no_output_is_compile_failure() {
        let (_temp, layout, assembler) = scratch(false);
        let asset = layout.intermediate("part_a", "u3d");
        std::fs::write(&asset, b"U3D").expect("asset");

        let outcome = assembler.assemble("part_a", &asset).await.expect("assemble");
        assert!(matches!(outcome, AssemblyOutcome::CompileFailed { .. }));
        assert!(!layout.document_for("part_a").exists());
    }

    #[tokio::test]
    async fn test_stale_render_is_not_mistaken_for_output() {
        let (_temp, layout, assembler) = scratch(false);
        std::fs::write(expected_output(&layout.template_file), b"%PDF old").expect("stale");
        let asset = layout.intermediate("b", "u3d");
        std::fs::write(&asset, b"U3D").expect("asset");

        let outcome = assembler.assemble("b", &asset).await.expect("assemble");
        assert!(matches!(outcome, AssemblyOutcome::CompileFailed { .. }));
    }

    #[tokio::test]
    async fn test_missing_asset_is_error() {
        let (_temp, layout, assembler) = scratch(true);
        let err = assembler
            .assemble("x", &layout.intermediate("x", "u3d"))
            .await
            .expect_err("missing asset");
        assert!(matches!(err, DocumentError::AssetMissing(_)));
        assert_eq!(assembler.compiler.runs.load(Ordering::SeqCst), 0);
    }
}
