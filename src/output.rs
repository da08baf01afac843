//! Table and JSON output for the batch summary.

use serde::Serialize;
use tabled::{Table, Tabled};

use pdf3d_pipeline::{BatchSummary, JobReport, MetricsSnapshot};

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

#[derive(Debug, Serialize, Tabled)]
struct JobRow {
    source: String,
    status: String,
    outcome: String,
    document: String,
    reason: String,
    duration: String,
}

impl From<&JobReport> for JobRow {
    fn from(report: &JobReport) -> Self {
        Self {
            source: report.source.clone(),
            status: report.status().to_string(),
            outcome: report
                .outcome
                .map(|o| o.to_string())
                .unwrap_or_else(|| "-".to_string()),
            document: report
                .document
                .as_ref()
                .and_then(|d| d.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "-".to_string()),
            reason: report
                .failure
                .as_ref()
                .map(|f| f.to_string())
                .unwrap_or_default(),
            duration: format!("{:.1}s", report.duration.as_secs_f64()),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct TotalsRow {
    started: u64,
    succeeded: u64,
    skipped: u64,
    failed: u64,
    timed_out: u64,
    output_bytes: u64,
    p50: String,
    p95: String,
}

impl From<&MetricsSnapshot> for TotalsRow {
    fn from(m: &MetricsSnapshot) -> Self {
        let ms = |d: Option<std::time::Duration>| {
            d.map(|d| format!("{}ms", d.as_millis()))
                .unwrap_or_else(|| "-".to_string())
        };
        Self {
            started: m.jobs_started,
            succeeded: m.jobs_succeeded,
            skipped: m.jobs_skipped,
            failed: m.jobs_failed,
            timed_out: m.jobs_timed_out,
            output_bytes: m.total_output_bytes,
            p50: ms(m.duration_p50),
            p95: ms(m.duration_p95),
        }
    }
}

/// Print the summary in the selected format
pub fn print_summary(summary: &BatchSummary, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if summary.reports.is_empty() {
                println!("No sources processed.");
                return;
            }
            let rows: Vec<JobRow> = summary.reports.iter().map(JobRow::from).collect();
            println!("{}", Table::new(&rows));
            println!("{}", Table::new([TotalsRow::from(&summary.metrics)]));
            println!("Run {}", summary.run_id);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string());
            println!("{}", json);
        }
    }
}
