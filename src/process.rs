//! Single-image pipeline and parallel batch processing.
//!
//! ## Pipeline
//!
//! The kind is resolved once, up front, and selects one of two profiles:
//!
//! ```text
//! load → resolve kind → trim (if meaningful) → unpremultiply
//!      ┌ pixel art:    defringe → integer nearest-neighbour scale
//!      └ illustration: [super-resolution]
//!      → fit to target (pad by default)
//!      → [smooth alpha edges, illustration only] → sharpen → save → record
//! ```
//!
//! [`run_pipeline`] is the in-memory part. [`process_one`] adds loading,
//! target resolution, the atomic save and the metadata record.
//! [`process_batch`] maps the same steps over a directory with rayon.
//!
//! ## Failures
//!
//! A failing step aborts the image: nothing is written to the output path,
//! and the failure is recorded in the metadata log. A single image returns
//! the error wrapped with its source path ([`ProcessError::Image`]); a batch
//! records it and carries on with the next image.
//! An invalid config is rejected up front, before any input is read.
//!
//! ## Output Structure
//!
//! ```text
//! input/                    output/
//! ├── hero.gif        →     ├── hero.png
//! ├── tiles/                ├── tiles/            (with --recursive)
//! │   └── grass.bmp   →     │   └── grass.png
//! └── notes.txt             └── ...
//! ```
//!
//! Outputs are always PNG so the colour profile survives.

use crate::config::{ConfigError, PipelineConfig};
use crate::imaging::{
    ImagingError, RealEsrgan, SuperResolver, TrimDecision, classify_kind, defringe,
    fit_to_size, is_supported_input, load_asset, resolve_target, save_asset, scale_pixel_art,
    smart_square, smooth_edges, trim_if_meaningful, unpremultiply, unsharp_mask,
};
use crate::metadata::{MetadataLog, ProcessingMetadata};
use crate::types::{Asset, Kind, SizeMode, SuperRes, Target, ValidationError};
use image::RgbaImage;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] ImagingError),
    #[error("Failed to write metadata log {}: {source}", .path.display())]
    Log {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}: {source}", .path.display())]
    Image {
        path: PathBuf,
        source: Box<ProcessError>,
    },
}

/// Result of the in-memory pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub kind: Kind,
    pub trim: TrimDecision,
    pub asset: Asset,
}

/// Progress events for the CLI printer.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    BatchStarted {
        total: usize,
    },
    /// `index` is the 1-based position in the sorted input list; events
    /// arrive in completion order.
    ImageProcessed {
        index: usize,
        total: usize,
        record: ProcessingMetadata,
    },
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// One record per input, in input order.
    pub records: Vec<ProcessingMetadata>,
}

impl BatchResult {
    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.ok).count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.succeeded()
    }
}

/// A source image and where its output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub src: PathBuf,
    pub dst: PathBuf,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Run every pixel stage on `asset` for the given `target`.
///
/// The colour profile is carried through untouched.
pub fn run_pipeline(
    asset: Asset,
    target: Target,
    config: &PipelineConfig,
    resolver: &impl SuperResolver,
) -> Result<PipelineOutput, ImagingError> {
    let kind = config
        .output
        .kind
        .resolve(|| classify_kind(&asset.pixels, &config.classifier.params()));
    log::debug!("kind: {kind}");

    let Asset {
        pixels,
        icc_profile,
    } = asset;
    let (pixels, trim) = trim_if_meaningful(pixels, &config.trim.params());
    let asset = Asset::new(pixels)
        .with_icc_profile(icc_profile)
        .map(unpremultiply);

    let asset = match kind {
        Kind::PixelArt => asset.map(|img| {
            let img = defringe(img, config.pixel_art.defringe_radius);
            scale_pixel_art(img, target.dimensions())
        }),
        Kind::Illustration => match config.output.superres {
            SuperRes::RealEsrgan => {
                asset.try_map(|img| resolver.enhance(&img, config.superres.scale))?
            }
            SuperRes::None => asset,
        },
    };

    let asset = asset.try_map(|img| fit_to_target(img, target, config))?;

    let asset = match kind {
        Kind::PixelArt => asset,
        Kind::Illustration => {
            asset.map(|img| smooth_edges(img, config.illustration.alpha_smooth_radius))
        }
    };
    let asset = asset.map(|img| unsharp_mask(img, &config.sharpening(kind)));

    Ok(PipelineOutput { kind, trim, asset })
}

fn fit_to_target(
    pixels: RgbaImage,
    target: Target,
    config: &PipelineConfig,
) -> Result<RgbaImage, ImagingError> {
    let options = config.output.fit_options();
    match target {
        Target::Square(side) => smart_square(pixels, side, &options),
        Target::Box(size) => fit_to_size(pixels, size.width, size.height, &options),
    }
}

// ============================================================================
// Single image
// ============================================================================

/// Normalize `src` into `dst` using the Real-ESRGAN settings from `config`.
///
/// Appends to the configured JSONL log, if any.
pub fn process_one(
    src: &Path,
    dst: &Path,
    config: &PipelineConfig,
) -> Result<ProcessingMetadata, ProcessError> {
    let resolver = RealEsrgan::new(config.superres.settings());
    let log = config.processing.log_jsonl.as_ref().map(MetadataLog::new);
    process_one_with_resolver(&resolver, src, dst, config, log.as_ref())
}

/// Normalize `src` into `dst` with a caller-supplied [`SuperResolver`].
///
/// An invalid `config` is returned as is, before `src` is read or anything
/// is logged. A failure while processing the image is still appended to
/// `log`, and the error is returned wrapped in [`ProcessError::Image`].
pub fn process_one_with_resolver(
    resolver: &impl SuperResolver,
    src: &Path,
    dst: &Path,
    config: &PipelineConfig,
    log: Option<&MetadataLog>,
) -> Result<ProcessingMetadata, ProcessError> {
    let size_mode = checked_size_mode(config)?;
    let (record, outcome) = run_and_record(resolver, src, dst, size_mode, config, log)?;
    outcome.map_err(|e| ProcessError::Image {
        path: src.to_path_buf(),
        source: Box::new(e),
    })?;
    Ok(record)
}

/// Resolve the size mode and validate the rest of `config`.
fn checked_size_mode(config: &PipelineConfig) -> Result<SizeMode, ProcessError> {
    let size_mode = config.output.size_mode()?;
    config.validate()?;
    Ok(size_mode)
}

/// Run one image and append its record. The outer error is a log write
/// failure; pipeline failures are in the returned outcome.
fn run_and_record(
    resolver: &impl SuperResolver,
    src: &Path,
    dst: &Path,
    size_mode: SizeMode,
    config: &PipelineConfig,
    log: Option<&MetadataLog>,
) -> Result<(ProcessingMetadata, Result<(), ProcessError>), ProcessError> {
    let mut record = ProcessingMetadata::started(src);
    let outcome = normalize(resolver, src, dst, size_mode, config, &mut record);
    let record = match &outcome {
        Ok(()) => record,
        Err(e) => record.failed(e),
    };
    if let Some(log) = log {
        log.append(&record).map_err(|source| ProcessError::Log {
            path: log.path().to_path_buf(),
            source,
        })?;
    }
    Ok((record, outcome))
}

fn normalize(
    resolver: &impl SuperResolver,
    src: &Path,
    dst: &Path,
    size_mode: SizeMode,
    config: &PipelineConfig,
    record: &mut ProcessingMetadata,
) -> Result<(), ProcessError> {
    let asset = load_asset(src)?;
    let (w, h) = asset.dimensions();
    record.w = Some(w);
    record.h = Some(h);

    let target = resolve_target(w, h, size_mode);
    let output = run_pipeline(asset, target, config, resolver)?;
    record.kind = Some(output.kind);
    record.bbox = Some(output.trim.bbox);
    record.trimmed = Some(output.trim.trimmed);

    save_asset(&output.asset, dst)?;
    let (final_w, final_h) = output.asset.dimensions();
    record.dst = Some(dst.display().to_string());
    record.ok = true;
    record.final_w = Some(final_w);
    record.final_h = Some(final_h);

    log::info!(
        "{} → {} ({}, {w}x{h} → {final_w}x{final_h})",
        src.display(),
        dst.display(),
        output.kind
    );
    Ok(())
}

// ============================================================================
// Batch
// ============================================================================

/// Decodable images under `input_dir`, sorted by path.
pub fn discover_inputs(input_dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, ProcessError> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut inputs = Vec::new();
    for entry in WalkDir::new(input_dir).min_depth(1).max_depth(max_depth) {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() && is_supported_input(entry.path()) {
            inputs.push(entry.into_path());
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// Mirror `src` from `input_dir` into `output_dir` as a `.png`.
pub fn output_path_for(input_dir: &Path, output_dir: &Path, src: &Path) -> PathBuf {
    let relative = src
        .strip_prefix(input_dir)
        .ok()
        .map(Path::to_path_buf)
        .or_else(|| src.file_name().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("output"));
    output_dir.join(relative).with_extension("png")
}

/// Pair every input under `input_dir` with its output path.
pub fn plan_batch(
    input_dir: &Path,
    output_dir: &Path,
    recursive: bool,
) -> Result<Vec<BatchJob>, ProcessError> {
    Ok(discover_inputs(input_dir, recursive)?
        .into_iter()
        .map(|src| BatchJob {
            dst: output_path_for(input_dir, output_dir, &src),
            src,
        })
        .collect())
}

/// Normalize every image under `input_dir` into `output_dir` in parallel.
pub fn process_batch(
    input_dir: &Path,
    output_dir: &Path,
    recursive: bool,
    config: &PipelineConfig,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BatchResult, ProcessError> {
    checked_size_mode(config)?;
    let resolver = RealEsrgan::new(config.superres.settings());
    let jobs = plan_batch(input_dir, output_dir, recursive)?;
    process_batch_with_resolver(&resolver, &jobs, config, events)
}

/// Run `jobs` in parallel with a caller-supplied [`SuperResolver`].
///
/// An invalid `config` fails the whole batch before any image is read.
/// Per-image failures become failed records; only a metadata log write
/// failure aborts the batch.
pub fn process_batch_with_resolver(
    resolver: &impl SuperResolver,
    jobs: &[BatchJob],
    config: &PipelineConfig,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BatchResult, ProcessError> {
    let size_mode = checked_size_mode(config)?;
    let total = jobs.len();
    let metadata_log = config.processing.log_jsonl.as_ref().map(MetadataLog::new);
    if let Some(tx) = &events {
        tx.send(ProcessEvent::BatchStarted { total }).ok();
    }

    let records = jobs
        .par_iter()
        .enumerate()
        .map(|(i, job)| {
            let (record, outcome) = run_and_record(
                resolver,
                &job.src,
                &job.dst,
                size_mode,
                config,
                metadata_log.as_ref(),
            )?;
            if let Err(e) = outcome {
                log::warn!("{}: {e}", job.src.display());
            }
            if let Some(tx) = &events {
                tx.send(ProcessEvent::ImageProcessed {
                    index: i + 1,
                    total,
                    record: record.clone(),
                })
                .ok();
            }
            Ok::<_, ProcessError>(record)
        })
        .collect::<Result<Vec<_>, ProcessError>>()?;

    Ok(BatchResult { records })
}
