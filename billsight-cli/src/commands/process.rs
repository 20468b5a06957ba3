//! Process command - run one bill image through the full workflow.

use anyhow::{Context, Result};
use billsight_core::ProcessingRecord;
use billsight_processor::{BillProcessor, ImageProcessor};
use billsight_providers::{ProviderRegistry, build_manager};
use billsight_store::save_json;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::{load_settings, open_store};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Bill or receipt image (PNG or JPEG).
    pub image: PathBuf,

    /// Primary model (registry name).
    #[arg(long)]
    pub primary: Option<String>,

    /// Fallback model (registry name).
    #[arg(long, conflicts_with = "no_fallback")]
    pub fallback: Option<String>,

    /// Disable the fallback model for this run.
    #[arg(long)]
    pub no_fallback: bool,

    /// Minimum confidence an extraction needs to be accepted.
    #[arg(long)]
    pub min_confidence: Option<f64>,

    /// Do not write the processing record to the output directory.
    #[arg(long)]
    pub no_save_output: bool,
}

/// Runs the process command.
pub async fn run(args: &ProcessArgs, cli: &Cli) -> Result<ExitCode> {
    let mut settings = load_settings().await;
    if let Some(primary) = &args.primary {
        settings.primary_model.clone_from(primary);
    }
    if args.no_fallback {
        settings.fallback_model = None;
    } else if let Some(fallback) = &args.fallback {
        settings.fallback_model = Some(fallback.clone());
    }
    if let Some(min) = args.min_confidence {
        settings.min_confidence = min;
    }
    settings.validate(ProviderRegistry::contains)?;

    let manager = build_manager(
        &settings.primary_model,
        settings.fallback_model.as_deref(),
        settings.request_timeout(),
    )?;
    let store = open_store(&settings).await?;
    let preparer = ImageProcessor::new(settings.max_file_size_bytes(), settings.max_image_dimension);

    let processor = BillProcessor::new(manager, Arc::new(preparer), Arc::new(store))
        .with_thresholds(settings.thresholds());

    info!(image = %args.image.display(), "Processing bill");
    let outcome = processor.process(&args.image).await;

    if let Some(record) = outcome.data.as_ref().filter(|_| !args.no_save_output) {
        match write_record(&settings.output_dir(), record).await {
            Ok(path) => info!(path = %path.display(), "Record written"),
            Err(e) => warn!(error = %e, "Failed to write record file"),
        }
    }

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_outcome(&outcome));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&outcome)?);
        }
    }

    Ok(if outcome.success {
        ExitCode::Success
    } else if outcome.is_rejected() {
        ExitCode::QualityRejected
    } else {
        ExitCode::Error
    })
}

/// Writes `record` as `bill_<id>_<timestamp>.json` under `dir`.
async fn write_record(dir: &Path, record: &ProcessingRecord) -> Result<PathBuf> {
    let path = dir.join(record_file_name(record));
    save_json(&path, record)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn record_file_name(record: &ProcessingRecord) -> String {
    format!(
        "bill_{}_{}.json",
        record.bill_metadata.bill_id,
        record.bill_metadata.processing_timestamp.format("%Y%m%d_%H%M%S")
    )
}
