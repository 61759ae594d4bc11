//! CLI output formatting.
//!
//! Every command has a pure `format_*` function returning display lines and a
//! thin `print_*` wrapper, so the layout is unit tested without capturing
//! stdout.
//!
//! # Output Format
//!
//! ## Process / Batch
//!
//! ```text
//! Normalizing 3 images
//! [001/003] hero.png → out/hero.png
//!     pixel_art, 37x52 → 256x256
//! [002/003] broken.png
//!     failed: Failed to decode image: ...
//! [003/003] banner.png → out/banner.png
//!     illustration, 900x300 → 512x512 (trimmed)
//!
//! 2 normalized, 1 failed
//!     broken.png
//! ```
//!
//! ## Suggest size
//!
//! ```text
//! 300x200 (power_of_two) → 256x128
//! ```
//!
//! ## Classify
//!
//! ```text
//! sprite.png: pixel_art
//!     Unique colours: 12 (pixel art below 80)
//!     Edge ratio: 0.214 (pixel art above 0.120)
//! ```

use crate::imaging::{ClassifierParams, KindStats};
use crate::metadata::ProcessingMetadata;
use crate::process::{BatchResult, ProcessEvent};
use crate::types::{Kind, TargetSize};
use std::path::Path;

/// Last path component, or the whole string when there is none.
fn file_label(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

// ============================================================================
// Process output
// ============================================================================

/// Format one processed image: a header line plus an indented detail line.
pub fn format_record(record: &ProcessingMetadata) -> Vec<String> {
    let mut header = file_label(&record.src);
    if let Some(dst) = &record.dst {
        header.push_str(&format!(" \u{2192} {dst}"));
    }
    let mut lines = vec![header];

    if !record.ok {
        lines.push(format!(
            "    failed: {}",
            record.error.as_deref().unwrap_or("unknown error")
        ));
        return lines;
    }

    let kind = record.kind.map(Kind::as_str).unwrap_or("unknown");
    let mut detail = format!("    {kind}");
    if let (Some(w), Some(h), Some(fw), Some(fh)) =
        (record.w, record.h, record.final_w, record.final_h)
    {
        detail.push_str(&format!(", {w}x{h} \u{2192} {fw}x{fh}"));
    }
    if record.trimmed == Some(true) {
        detail.push_str(" (trimmed)");
    }
    lines.push(detail);
    lines
}

/// Format a single batch progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::BatchStarted { total } => {
            let noun = if *total == 1 { "image" } else { "images" };
            vec![format!("Normalizing {total} {noun}")]
        }
        ProcessEvent::ImageProcessed {
            index,
            total,
            record,
        } => {
            let width = total.to_string().len().max(3);
            let mut lines = format_record(record);
            lines[0] = format!("[{index:0width$}/{total:0width$}] {}", lines[0]);
            lines
        }
    }
}

/// Format the closing summary of a batch run, listing failed inputs.
pub fn format_batch_summary(result: &BatchResult) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!(
            "{} normalized, {} failed",
            result.succeeded(),
            result.failed()
        ),
    ];
    for record in result.records.iter().filter(|r| !r.ok) {
        lines.push(format!("    {}", record.src));
    }
    lines
}

pub fn print_record(record: &ProcessingMetadata) {
    for line in format_record(record) {
        println!("{}", line);
    }
}

pub fn print_batch_summary(result: &BatchResult) {
    for line in format_batch_summary(result) {
        println!("{}", line);
    }
}

// ============================================================================
// Inspection commands
// ============================================================================

pub fn format_suggest_size(width: u32, height: u32, mode_name: &str, size: TargetSize) -> String {
    format!("{width}x{height} ({mode_name}) \u{2192} {size}")
}

/// Format the classifier verdict together with the statistics behind it.
pub fn format_classification(
    path: &Path,
    stats: &KindStats,
    params: &ClassifierParams,
) -> Vec<String> {
    vec![
        format!("{}: {}", path.display(), stats.kind(params)),
        format!(
            "    Unique colours: {} (pixel art below {})",
            stats.unique_colors, params.max_colors
        ),
        format!(
            "    Edge ratio: {:.3} (pixel art above {:.3})",
            stats.edge_ratio, params.min_edge_ratio
        ),
    ]
}

pub fn print_classification(path: &Path, stats: &KindStats, params: &ClassifierParams) {
    for line in format_classification(path, stats, params) {
        println!("{}", line);
    }
}

/// One line describing the super-resolution probe result.
pub fn format_superres_check(result: &Result<std::path::PathBuf, String>) -> String {
    match result {
        Ok(binary) => format!("super-resolution available: {}", binary.display()),
        Err(reason) => format!("super-resolution unavailable: {reason}"),
    }
}
