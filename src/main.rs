//! 3D PDF batch: converts every CAD document in the input area into a PDF
//! with an embedded interactive 3D model.

mod output;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use pdf3d_automation::CommandBridge;
use pdf3d_core::{AppConfig, Layout};
use pdf3d_document::LatexCompiler;
use pdf3d_mesh::IdtfConverter;
use pdf3d_pipeline::BatchDriver;

use output::OutputFormat;

/// Batch-convert CAD documents into 3D PDF reports
#[derive(Debug, Parser)]
#[command(name = "pdf3d-batch", version, about)]
struct Cli {
    /// Configuration file (defaults to config/default.toml plus PDF3D_ENV overlay)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pipeline root holding the Input, Temp, and Output areas
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Summary output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config, cli.format).await {
        tracing::error!("Batch error: {e:#}");
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_file(path)?,
        None => {
            let env = std::env::var("PDF3D_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)?
        }
    };

    if let Some(root) = &cli.root {
        config.layout.root = root.clone();
    }
    Ok(config)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(false)
                .init();
        }
    }
}

async fn run(config: AppConfig, format: OutputFormat) -> anyhow::Result<()> {
    tracing::info!("=== 3D PDF PIPELINE v{} ===", env!("CARGO_PKG_VERSION"));

    let layout = Layout::from_config(&config.layout).context("Failed to resolve layout")?;
    layout
        .ensure_directories()
        .context("Failed to create pipeline directories")?;
    tracing::info!(
        input = %layout.input_dir.display(),
        output = %layout.output_dir.display(),
        "Pipeline directories ready"
    );

    let driver = BatchDriver::from_config(
        &config,
        layout,
        CommandBridge::new(&config.application),
        IdtfConverter::new(&config.mesh),
        LatexCompiler::new(&config.document),
    )
    .context("Failed to load document template")?;

    let summary = driver.run().await.context("Failed to read input area")?;
    tracing::info!(
        done = summary.count("DONE"),
        skipped = summary.count("SKIPPED"),
        failed = summary.count("FAIL"),
        "Batch complete"
    );

    output::print_summary(&summary, format);
    Ok(())
}
