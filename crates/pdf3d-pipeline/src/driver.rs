//! Sequential batch driver.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use pdf3d_automation::{
    AutomationError, CadApplication, CompletionWatcher, ExportController, Job, Outcome,
    discover_sources,
};
use pdf3d_core::{AppConfig, Layout, move_replacing};
use pdf3d_document::{
    AssemblyOutcome, DocumentAssembler, DocumentCompiler, DocumentError, DocumentTemplate,
};
use pdf3d_mesh::{AssetEncoder, IdtfWriter, MeshError, MeshNormalizer};

use crate::error::JobFailure;
use crate::metrics::BatchMetrics;
use crate::report::{BatchSummary, JobReport};
use crate::state::JobState;

const SEPARATOR: &str = "------------------------------";

/// Feeds discovered sources through export, normalization, and assembly one
/// at a time. A failing job never stops the batch.
pub struct BatchDriver<A, E, C>
where
    A: CadApplication,
    E: AssetEncoder,
    C: DocumentCompiler,
{
    layout: Layout,
    controller: ExportController<A>,
    normalizer: MeshNormalizer,
    encoder: E,
    assembler: DocumentAssembler<C>,
    metrics: Arc<BatchMetrics>,
}

impl<A, E, C> BatchDriver<A, E, C>
where
    A: CadApplication,
    E: AssetEncoder,
    C: DocumentCompiler,
{
    /// Assemble a driver from its stages.
    pub fn new(
        layout: Layout,
        controller: ExportController<A>,
        normalizer: MeshNormalizer,
        encoder: E,
        assembler: DocumentAssembler<C>,
    ) -> Self {
        Self {
            layout,
            controller,
            normalizer,
            encoder,
            assembler,
            metrics: Arc::new(BatchMetrics::new()),
        }
    }

    /// Wire every stage from configuration around the given collaborators.
    pub fn from_config(
        config: &AppConfig,
        layout: Layout,
        app: A,
        encoder: E,
        compiler: C,
    ) -> Result<Self, DocumentError> {
        let template = DocumentTemplate::load(config.document.template_path.as_deref())?;
        let controller = ExportController::new(app, &layout, CompletionWatcher::new(&config.watcher));
        let assembler = DocumentAssembler::new(template, compiler, &layout);
        Ok(Self::new(
            layout,
            controller,
            MeshNormalizer::new(&config.mesh),
            encoder,
            assembler,
        ))
    }

    /// Shared metrics collector.
    pub fn metrics(&self) -> Arc<BatchMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Process every recognized source in the input area.
    ///
    /// Only a failure to list the input area is returned as `Err`.
    pub async fn run(&self) -> Result<BatchSummary, AutomationError> {
        let run_id = Uuid::now_v7();
        let started_at = Utc::now();
        let span = info_span!("batch", %run_id);

        let reports = async {
            let jobs = discover_sources(&self.layout)?;
            if jobs.is_empty() {
                warn!(input = %self.layout.input_dir.display(), "No supported files in input area");
                return Ok(Vec::new());
            }
            info!(count = jobs.len(), "Sources discovered");

            let mut reports = Vec::with_capacity(jobs.len());
            for job in &jobs {
                reports.push(self.process(job).await);
                info!("{SEPARATOR}");
            }
            Ok::<_, AutomationError>(reports)
        }
        .instrument(span)
        .await?;

        Ok(BatchSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            reports,
            metrics: self.metrics.snapshot(),
        })
    }

    /// Run one job to a terminal state and report it.
    pub async fn process(&self, job: &Job) -> JobReport {
        let span = info_span!("job", job = %job.file_name);
        async {
            let start = Instant::now();
            let mut report = JobReport::queued(job);
            info!(kind = ?job.kind, drawing = job.kind.is_drawing(), "Queued");
            self.metrics.record_started();

            let result = self.run_stages(job, &mut report).await;
            report.duration = start.elapsed();

            match result {
                Ok(document) => {
                    let bytes = std::fs::metadata(&document).map(|m| m.len()).unwrap_or(0);
                    self.metrics.record_success(report.duration, bytes);
                    info!(document = %document.display(), "Document produced");
                    report.document = Some(document);
                }
                Err(None) => {
                    self.metrics.record_skipped(report.duration);
                    info!("Skipped, no 3D content");
                }
                Err(Some(failure)) => {
                    if matches!(failure, JobFailure::TimeoutExceeded(_)) {
                        self.metrics.record_timeout(report.duration);
                    } else {
                        self.metrics.record_failure(report.duration);
                    }
                    error!(code = failure.code(), reason = %failure, "Job failed");
                    if !report.state.is_terminal() {
                        advance(&mut report, JobState::Aborted);
                    }
                    report.failure = Some(failure);
                }
            }
            report
        }
        .instrument(span)
        .await
    }

    /// The stages after queueing. `Err(None)` is a quiet skip.
    async fn run_stages(&self, job: &Job, report: &mut JobReport) -> Result<PathBuf, Option<JobFailure>> {
        advance(report, JobState::Triggered);
        let observation = self.controller.trigger(job).await.map_err(|e| Some(e.into()))?;
        report.outcome = Some(observation.outcome);
        advance(report, JobState::Observed(observation.outcome));

        match observation.outcome {
            Outcome::Success => {}
            Outcome::SkippedNon3d => return Err(None),
            Outcome::Error => {
                return Err(Some(JobFailure::WorkerReportedError(
                    observation.log.unwrap_or_default(),
                )));
            }
            Outcome::Timeout => {
                return Err(Some(JobFailure::TimeoutExceeded(
                    observation.elapsed.as_millis() as u64,
                )));
            }
        }

        let stl = self.layout.intermediate(&job.stem, "stl");
        move_replacing(&self.layout.artifact_file, &stl).map_err(|e| Some(e.into()))?;
        debug!(artifact = %stl.display(), "Artifact preserved");

        let scene = self.layout.intermediate(&job.stem, "idtf");
        self.normalize(&job.stem, stl, scene.clone())
            .await
            .map_err(|e| Some(e.into()))?;
        advance(report, JobState::Normalized);

        let asset = self.layout.intermediate(&job.stem, "u3d");
        self.encoder
            .encode(&scene, &asset)
            .await
            .map_err(|e| Some(e.into()))?;

        match self.assembler.assemble(&job.stem, &asset).await {
            Ok(AssemblyOutcome::Rendered { document }) => {
                advance(report, JobState::Assembled);
                Ok(document)
            }
            Ok(AssemblyOutcome::CompileFailed { reason }) => {
                Err(Some(JobFailure::CompileFailure(reason)))
            }
            Err(e) => Err(Some(e.into())),
        }
    }

    /// Normalize and serialize off the async runtime.
    async fn normalize(&self, stem: &str, stl: PathBuf, scene: PathBuf) -> Result<(), MeshError> {
        let normalizer = self.normalizer.clone();
        let writer = IdtfWriter::new(stem);
        tokio::task::spawn_blocking(move || {
            let decorated = normalizer.process(&stl)?;
            writer.write(&decorated, &scene)
        })
        .await
        .map_err(|e| MeshError::Io(std::io::Error::other(e)))?
    }
}

fn advance(report: &mut JobReport, next: JobState) {
    debug_assert!(
        report.state.can_transition(next),
        "illegal transition {} -> {}",
        report.state,
        next
    );
    debug!(from = %report.state, to = %next, "Job state");
    report.state = next;
}
