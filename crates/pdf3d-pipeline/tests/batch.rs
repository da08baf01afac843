//! End-to-end batch scenarios against a scripted CAD application.
//!
//! Time is paused, so the 1 s polling quantum and 60 s ceiling elapse
//! instantly while keeping their ordering.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nalgebra::Point3;

use pdf3d_automation::{AutomationError, CadApplication, DocumentHandle, Outcome};
use pdf3d_core::config::layout::LayoutConfig;
use pdf3d_core::{AppConfig, Layout};
use pdf3d_document::{DocumentCompiler, DocumentError, expected_output};
use pdf3d_mesh::{AssetEncoder, Mesh, MeshError};
use pdf3d_pipeline::{BatchDriver, JobFailure, JobState};

/// What the scripted application does when a given source is triggered.
#[derive(Clone)]
enum Script {
    Export { after: Duration },
    Log { after: Duration, text: &'static str },
    Corrupt { after: Duration },
    OpenFails,
    Nothing,
}

struct ScriptedApp {
    layout: Layout,
    scripts: HashMap<&'static str, Script>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedApp {
    fn new(layout: &Layout, scripts: &[(&'static str, Script)]) -> Arc<Self> {
        Arc::new(Self {
            layout: layout.clone(),
            scripts: scripts.iter().cloned().collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().expect("lock").push(call.to_string());
    }
}

/// A flat 10x5 quad grid: 100 triangles, just over 5000 bytes as binary STL.
fn exported_mesh() -> Mesh {
    let (nx, ny) = (10usize, 5usize);
    let mut vertices = Vec::new();
    for j in 0..=ny {
        for i in 0..=nx {
            vertices.push(Point3::new(i as f64 * 25.4, j as f64 * 25.4, 100.0));
        }
    }
    let idx = |i: usize, j: usize| j * (nx + 1) + i;
    let mut faces = Vec::new();
    for j in 0..ny {
        for i in 0..nx {
            faces.push([idx(i, j), idx(i + 1, j), idx(i + 1, j + 1)]);
            faces.push([idx(i, j), idx(i + 1, j + 1), idx(i, j + 1)]);
        }
    }
    Mesh::new(vertices, faces).expect("grid mesh")
}

/// A binary STL header announcing 1000 facets followed by too few bytes.
fn truncated_stl() -> Vec<u8> {
    let mut bytes = vec![0u8; 80];
    bytes.extend_from_slice(&1000u32.to_le_bytes());
    bytes.extend_from_slice(&[0x3f; 420]);
    bytes
}

#[async_trait]
impl CadApplication for ScriptedApp {
    async fn attach(&self) -> Result<bool, AutomationError> {
        self.record("attach");
        Ok(true)
    }

    async fn launch(&self) -> Result<(), AutomationError> {
        self.record("launch");
        Ok(())
    }

    async fn set_silent(&self, silent: bool) -> Result<(), AutomationError> {
        self.record(if silent { "silent" } else { "interactive" });
        Ok(())
    }

    async fn open_document(&self, path: &Path) -> Result<DocumentHandle, AutomationError> {
        self.record("open");
        let descriptor = std::fs::read_to_string(&self.layout.job_file)?;
        let name = Path::new(descriptor.trim())
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let script = self.scripts.get(name.as_str()).cloned().unwrap_or(Script::Nothing);
        if matches!(script, Script::OpenFails) {
            return Err(AutomationError::BridgeFailed {
                verb: "open".to_string(),
                code: 1,
                stderr: "Documents.Open: RPC server unavailable".to_string(),
            });
        }
        let artifact = self.layout.artifact_file.clone();
        let log = self.layout.log_file.clone();
        tokio::spawn(async move {
            match script {
                Script::Export { after } => {
                    tokio::time::sleep(after).await;
                    exported_mesh().write_stl(&artifact).expect("write artifact");
                }
                Script::Log { after, text } => {
                    tokio::time::sleep(after).await;
                    std::fs::write(&log, text).expect("write log");
                }
                Script::Corrupt { after } => {
                    tokio::time::sleep(after).await;
                    std::fs::write(&artifact, truncated_stl()).expect("write artifact");
                }
                Script::OpenFails | Script::Nothing => {}
            }
        });

        Ok(DocumentHandle {
            path: path.to_path_buf(),
        })
    }

    async fn close_document(&self, _document: &DocumentHandle) -> Result<(), AutomationError> {
        self.record("close");
        Ok(())
    }
}

/// Stands in for the U3D converter.
struct CopyEncoder;

#[async_trait]
impl AssetEncoder for CopyEncoder {
    async fn encode(&self, scene: &Path, output: &Path) -> Result<(), MeshError> {
        let text = std::fs::read_to_string(scene)?;
        assert!(text.starts_with("FILE_FORMAT \"IDTF\""));
        std::fs::write(output, text)?;
        Ok(())
    }
}

/// Stands in for pdflatex: emits a document only if the asset is in place.
struct FakeLatex;

#[async_trait]
impl DocumentCompiler for FakeLatex {
    async fn compile(&self, template: &Path) -> Result<(), DocumentError> {
        let source = std::fs::read_to_string(template)?;
        if source.contains("{model.u3d}") && template.with_file_name("model.u3d").is_file() {
            std::fs::write(expected_output(template), b"%PDF-1.5 fake")?;
        }
        Ok(())
    }
}

struct Harness {
    _temp: tempfile::TempDir,
    layout: Layout,
}

impl Harness {
    fn new(sources: &[&str]) -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let layout = Layout::under(temp.path(), &LayoutConfig::default());
        layout.ensure_directories().expect("dirs");
        std::fs::write(&layout.processor_file, b"processor").expect("processor");
        for name in sources {
            std::fs::write(layout.input_dir.join(name), b"cad").expect("source");
        }
        Self { _temp: temp, layout }
    }

    fn driver(&self, app: Arc<ScriptedApp>) -> BatchDriver<Arc<ScriptedApp>, CopyEncoder, FakeLatex> {
        BatchDriver::from_config(
            &AppConfig::default(),
            self.layout.clone(),
            app,
            CopyEncoder,
            FakeLatex,
        )
        .expect("driver")
    }

    fn outputs(&self) -> Vec<PathBuf> {
        let mut out: Vec<_> = std::fs::read_dir(&self.layout.output_dir)
            .expect("output dir")
            .map(|e| e.expect("entry").path())
            .collect();
        out.sort();
        out
    }
}

#[tokio::test(start_paused = true)]
async fn test_part_exports_to_document() {
    let h = Harness::new(&["part_a.ipt"]);
    let app = ScriptedApp::new(
        &h.layout,
        &[("part_a.ipt", Script::Export { after: Duration::from_millis(1500) })],
    );

    let summary = h.driver(app.clone()).run().await.expect("batch");
    let report = &summary.reports[0];

    assert_eq!(report.outcome, Some(Outcome::Success));
    assert_eq!(report.state, JobState::Assembled);
    assert_eq!(report.status(), "DONE");
    assert_eq!(report.document.as_deref(), Some(h.layout.document_for("part_a").as_path()));
    assert!(h.layout.asset_file.is_file());
    assert!(h.layout.intermediate("part_a", "stl").is_file());
    assert!(!h.layout.artifact_file.exists());
    assert_eq!(h.outputs(), vec![h.layout.document_for("part_a")]);
    assert_eq!(
        app.calls(),
        vec!["attach", "silent", "open", "close", "interactive"]
    );
    assert_eq!(summary.metrics.jobs_succeeded, 1);
}

#[tokio::test(start_paused = true)]
async fn test_drawing_is_skipped_and_batch_continues() {
    let h = Harness::new(&["drawing.dwg", "part_a.ipt"]);
    let app = ScriptedApp::new(
        &h.layout,
        &[
            (
                "drawing.dwg",
                Script::Log {
                    after: Duration::from_millis(500),
                    text: "WARNING: 2D",
                },
            ),
            ("part_a.ipt", Script::Export { after: Duration::from_millis(500) }),
        ],
    );

    let summary = h.driver(app).run().await.expect("batch");
    let names: Vec<_> = summary.reports.iter().map(|r| r.source.as_str()).collect();
    assert_eq!(names, vec!["drawing.dwg", "part_a.ipt"]);

    let drawing = &summary.reports[0];
    assert_eq!(drawing.outcome, Some(Outcome::SkippedNon3d));
    assert_eq!(drawing.status(), "SKIPPED");
    assert!(drawing.failure.is_none());
    assert!(drawing.document.is_none());

    assert_eq!(summary.reports[1].status(), "DONE");
    assert_eq!(h.outputs(), vec![h.layout.document_for("part_a")]);
    assert_eq!(summary.metrics.jobs_skipped, 1);
}

#[tokio::test(start_paused = true)]
async fn test_silent_application_times_out() {
    let h = Harness::new(&["a_slow.iam", "b_part.ipt"]);
    let app = ScriptedApp::new(
        &h.layout,
        &[
            ("a_slow.iam", Script::Nothing),
            ("b_part.ipt", Script::Export { after: Duration::from_millis(200) }),
        ],
    );

    let summary = h.driver(app.clone()).run().await.expect("batch");
    let slow = &summary.reports[0];
    assert_eq!(slow.outcome, Some(Outcome::Timeout));
    assert_eq!(slow.status(), "FAIL");
    assert!(matches!(slow.failure, Some(JobFailure::TimeoutExceeded(ms)) if ms >= 60_000));
    assert!(slow.duration >= Duration::from_secs(60));

    assert_eq!(summary.reports[1].status(), "DONE");
    assert_eq!(summary.metrics.jobs_timed_out, 1);
    assert_eq!(
        app.calls().iter().filter(|c| *c == "close").count(),
        2,
        "document closed after the timeout as well"
    );
}

#[tokio::test(start_paused = true)]
async fn test_application_fault_aborts_job_and_batch_continues() {
    let h = Harness::new(&["a_locked.ipt", "b_part.ipt"]);
    let app = ScriptedApp::new(
        &h.layout,
        &[
            ("a_locked.ipt", Script::OpenFails),
            ("b_part.ipt", Script::Export { after: Duration::from_millis(400) }),
        ],
    );

    let summary = h.driver(app.clone()).run().await.expect("batch");
    let locked = &summary.reports[0];
    assert!(matches!(locked.failure, Some(JobFailure::ExternalAppFault(_))));
    assert_eq!(locked.state, JobState::Aborted);
    assert!(locked.outcome.is_none());
    assert_eq!(summary.reports[1].status(), "DONE");
    assert_eq!(h.outputs(), vec![h.layout.document_for("b_part")]);

    let calls = app.calls();
    assert_eq!(
        &calls[..5],
        &["attach", "silent", "open", "close", "interactive"],
        "the failed open is still closed and interactive mode restored"
    );
}

#[tokio::test(start_paused = true)]
async fn test_unreadable_artifact_is_mesh_failure_and_batch_continues() {
    let h = Harness::new(&["a_corrupt.ipt", "b_part.ipt"]);
    let app = ScriptedApp::new(
        &h.layout,
        &[
            ("a_corrupt.ipt", Script::Corrupt { after: Duration::from_millis(300) }),
            ("b_part.ipt", Script::Export { after: Duration::from_millis(300) }),
        ],
    );

    let summary = h.driver(app).run().await.expect("batch");
    let corrupt = &summary.reports[0];
    assert_eq!(corrupt.outcome, Some(Outcome::Success));
    assert!(matches!(corrupt.failure, Some(JobFailure::MeshLoadFailure(_))));
    assert_eq!(corrupt.state, JobState::Aborted);
    assert!(corrupt.document.is_none());

    assert_eq!(summary.reports[1].status(), "DONE");
    assert_eq!(h.outputs(), vec![h.layout.document_for("b_part")]);
    assert_eq!(summary.metrics.jobs_failed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_worker_error_surfaces_log() {
    let h = Harness::new(&["broken.ipt"]);
    let app = ScriptedApp::new(
        &h.layout,
        &[(
            "broken.ipt",
            Script::Log {
                after: Duration::from_millis(2500),
                text: "ERROR: solid body could not be exported\n",
            },
        )],
    );

    let summary = h.driver(app).run().await.expect("batch");
    let report = &summary.reports[0];
    assert_eq!(report.outcome, Some(Outcome::Error));
    assert_eq!(
        report.failure,
        Some(JobFailure::WorkerReportedError(
            "ERROR: solid body could not be exported".to_string()
        ))
    );
    assert!(h.outputs().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_rerun_overwrites_documents() {
    let h = Harness::new(&["part_a.ipt"]);
    let script = [("part_a.ipt", Script::Export { after: Duration::from_millis(300) })];
    std::fs::write(h.layout.document_for("part_a"), b"previous run").expect("stale output");

    for _ in 0..2 {
        let app = ScriptedApp::new(&h.layout, &script);
        let summary = h.driver(app).run().await.expect("batch");
        assert_eq!(summary.reports[0].status(), "DONE");
    }

    assert_eq!(h.outputs(), vec![h.layout.document_for("part_a")]);
    assert_eq!(
        std::fs::read(h.layout.document_for("part_a")).expect("document"),
        b"%PDF-1.5 fake"
    );
}

#[tokio::test(start_paused = true)]
async fn test_missing_processor_fails_every_job_without_touching_app() {
    let h = Harness::new(&["a.ipt", "b.ipt"]);
    std::fs::remove_file(&h.layout.processor_file).expect("remove processor");
    let app = ScriptedApp::new(&h.layout, &[]);

    let summary = h.driver(app.clone()).run().await.expect("batch");
    assert_eq!(summary.reports.len(), 2);
    for report in &summary.reports {
        assert!(matches!(report.failure, Some(JobFailure::MissingDependency(_))));
        assert_eq!(report.state, JobState::Aborted);
        assert!(report.outcome.is_none());
    }
    assert!(app.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_compile_failure_is_reported() {
    struct NoOutput;

    #[async_trait]
    impl DocumentCompiler for NoOutput {
        async fn compile(&self, _template: &Path) -> Result<(), DocumentError> {
            Ok(())
        }
    }

    let h = Harness::new(&["part_a.ipt"]);
    let app = ScriptedApp::new(
        &h.layout,
        &[("part_a.ipt", Script::Export { after: Duration::from_millis(100) })],
    );
    let driver = BatchDriver::from_config(&AppConfig::default(), h.layout.clone(), app, CopyEncoder, NoOutput)
        .expect("driver");

    let summary = driver.run().await.expect("batch");
    let report = &summary.reports[0];
    assert_eq!(report.outcome, Some(Outcome::Success));
    assert!(matches!(report.failure, Some(JobFailure::CompileFailure(_))));
    assert_eq!(report.state, JobState::Aborted);
    assert!(h.outputs().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_empty_input_completes() {
    let h = Harness::new(&[]);
    std::fs::write(h.layout.input_dir.join("notes.txt"), b"not cad").expect("write");
    let app = ScriptedApp::new(&h.layout, &[]);

    let summary = h.driver(app).run().await.expect("batch");
    assert!(summary.reports.is_empty());
    assert_eq!(summary.metrics.jobs_started, 0);
}
