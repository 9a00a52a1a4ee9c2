use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use crosswatch::{
    BlobDetector, ImageSequenceSource, LogSink, Pipeline, PipelineParams, RunSummary,
    TemplateClassifier,
};
use log::{error, info, LevelFilter};

#[cfg(feature = "tracing")]
use crosswatch::core::init_tracing;
#[cfg(not(feature = "tracing"))]
use crosswatch::core::init_with_level;

/// Learn a digit from a sequence of frames, then report it next to a red
/// cross marker.
#[derive(Debug, Parser)]
#[command(name = "crosswatch", version, about)]
struct Args {
    /// Directory of frames (png, jpg, bmp), processed in file-name order.
    #[arg(long)]
    frames: PathBuf,

    /// Template classifier model (JSON).
    #[arg(long)]
    model: PathBuf,

    /// Pipeline configuration (JSON). Missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a JSON run summary here.
    #[arg(long)]
    report: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Emit tracing output as JSON.
    #[cfg(feature = "tracing")]
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    #[cfg(not(feature = "tracing"))]
    init_with_level(args.log_level)?;
    #[cfg(feature = "tracing")]
    {
        init_tracing(args.json_logs);
        log::set_max_level(args.log_level);
    }

    if let Err(err) = run(&args) {
        error!("{err}");
        return Err(err);
    }
    Ok(())
}

#[cfg_attr(feature = "tracing", tracing::instrument(level = "info", skip(args)))]
fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let params = match &args.config {
        Some(path) => load_config(path)?,
        None => PipelineParams::default(),
    };
    let classifier = TemplateClassifier::load(&args.model)?;
    let source = ImageSequenceSource::new(&args.frames)?;
    info!("{} frames in {}", source.len(), args.frames.display());

    let mut pipeline = Pipeline::new(source, classifier, BlobDetector::new(), LogSink, params)?;
    let summary = pipeline.run(args.max_frames)?;

    if let Some(path) = &args.report {
        write_report(path, &summary)?;
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<PipelineParams, Box<dyn std::error::Error>> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_report(path: &Path, summary: &RunSummary) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(summary)?)?;
    info!("report written to {}", path.display());
    Ok(())
}
